//! Load tests against a running server (`NETWORK_PORT=3000 cargo run`).
//! Run with `cargo test --test perf -- --ignored --nocapture`.

use std::time::Instant;

const BASE_URL: &str = "http://127.0.0.1:3000";
const NUM_USERS: usize = 100;
const POSTS_PER_USER: usize = 2;
const LOADED_USER_NAME: &str = "bob";
const LOADED_USER_PASSWORD: &str = "bob";
const LOADED_USER_POSTS: usize = 50;

/// A client that keeps its own session cookie and reports redirects
/// instead of following them.
fn session_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

async fn register(client: &reqwest::Client, username: &str, password: &str) -> bool {
    let resp = client
        .post(format!("{}/register", BASE_URL))
        .form(&[
            ("username", username),
            ("email", ""),
            ("password", password),
            ("confirmation", password),
        ])
        .send()
        .await;

    matches!(resp, Ok(r) if r.status() == 302)
}

async fn login(client: &reqwest::Client, username: &str, password: &str) -> bool {
    let resp = client
        .post(format!("{}/login", BASE_URL))
        .form(&[("username", username), ("password", password)])
        .send()
        .await;

    matches!(resp, Ok(r) if r.status() == 302)
}

async fn create_post(client: &reqwest::Client, content: &str) -> bool {
    let resp = client
        .post(format!("{}/posts/create", BASE_URL))
        .form(&[("content", content)])
        .send()
        .await;

    matches!(resp, Ok(r) if r.status() == 302)
}

#[ignore]
#[tokio::test(flavor = "multi_thread")]
async fn perf_test_users_with_posts() {
    let start = Instant::now();

    println!("\n=== Performance Test ===");
    println!("Creating {} users with {} posts each...", NUM_USERS, POSTS_PER_USER);

    let user_creation_start = Instant::now();
    let mut clients = Vec::new();
    for i in 0..NUM_USERS {
        let username = format!("perf_user_{}_{}", i, &uuid::Uuid::new_v4().to_string()[0..8]);
        let client = session_client();
        if register(&client, &username, "password123").await {
            clients.push(client);
        }

        if (i + 1) % 25 == 0 {
            println!("  Created {}/{} users", i + 1, NUM_USERS);
        }
    }
    let user_creation_time = user_creation_start.elapsed();

    println!(
        "User creation done: {} users in {:.2}s ({:.2} users/sec)",
        clients.len(),
        user_creation_time.as_secs_f64(),
        clients.len() as f64 / user_creation_time.as_secs_f64()
    );

    let post_creation_start = Instant::now();
    let mut posts_created = 0;
    let mut posts_failed = 0;
    for (idx, client) in clients.iter().enumerate() {
        for post_num in 0..POSTS_PER_USER {
            let content = format!("Post {} from user {} - perf test", post_num + 1, idx);
            if create_post(client, &content).await {
                posts_created += 1;
            } else {
                posts_failed += 1;
            }
        }
    }
    let post_creation_time = post_creation_start.elapsed();

    let feed_start = Instant::now();
    let feed = reqwest::get(format!("{}/?page=2", BASE_URL)).await;
    let feed_time = feed_start.elapsed();

    let total_time = start.elapsed();
    let total_requests = clients.len() + posts_created + posts_failed + 1;

    println!("\n=== Results ===");
    println!("Total time: {:.2}s", total_time.as_secs_f64());
    println!("User creation: {:.2}s", user_creation_time.as_secs_f64());
    println!("Post creation: {:.2}s", post_creation_time.as_secs_f64());
    println!("Feed page fetch: {}ms", feed_time.as_millis());
    if let Ok(resp) = feed {
        println!("Feed status: {}", resp.status());
    }
    println!("Users created: {}", clients.len());
    println!("Posts created: {}", posts_created);
    println!("Posts failed: {}", posts_failed);
    println!(
        "Throughput: {:.0} requests/sec",
        total_requests as f64 / total_time.as_secs_f64()
    );
}

#[ignore]
#[tokio::test(flavor = "multi_thread")]
async fn perf_test_profile_with_many_posts() {
    let client = session_client();
    let start = Instant::now();

    println!("\n=== Loaded Profile Test ===");

    if !login(&client, LOADED_USER_NAME, LOADED_USER_PASSWORD).await
        && !register(&client, LOADED_USER_NAME, LOADED_USER_PASSWORD).await
    {
        println!("Failed to login or create user");
        return;
    }

    let post_creation_start = Instant::now();
    let mut posts_created = 0;
    for post_num in 0..LOADED_USER_POSTS {
        let content = format!("Post {} - load test", post_num + 1);
        if create_post(&client, &content).await {
            posts_created += 1;
        }
    }
    let post_creation_time = post_creation_start.elapsed();

    let mut page_times = Vec::new();
    for page in 1..=5 {
        let fetch_start = Instant::now();
        let resp = client
            .get(format!("{}/{}?page={}", BASE_URL, LOADED_USER_NAME, page))
            .send()
            .await;
        page_times.push((page, fetch_start.elapsed(), resp.map(|r| r.status())));
    }

    println!("\n=== Results ===");
    println!("Total time: {:.2}s", start.elapsed().as_secs_f64());
    println!("Post creation: {:.2}s", post_creation_time.as_secs_f64());
    println!("Posts created: {}", posts_created);
    for (page, elapsed, status) in page_times {
        println!("Profile page {}: {}ms ({:?})", page, elapsed.as_millis(), status);
    }
}
