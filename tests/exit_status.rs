//! Runs the built binary and checks the only thing it communicates: its exit
//! status. Stdout and stderr must stay empty.

use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

// base64("rlblaster:secret")
const BASIC_SECRET: &str = "Basic cmxibGFzdGVyOnNlY3JldA==";

const THREE_ENTRIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Inbox</title>
  <id>tag:mail.example.com,2024:inbox</id>
  <updated>2024-05-01T12:00:00Z</updated>
  <entry><title>One</title><id>tag:mail.example.com,2024:1</id><updated>2024-05-01T12:00:00Z</updated></entry>
  <entry><title>Two</title><id>tag:mail.example.com,2024:2</id><updated>2024-05-01T12:00:00Z</updated></entry>
  <entry><title>Three</title><id>tag:mail.example.com,2024:3</id><updated>2024-05-01T12:00:00Z</updated></entry>
</feed>"#;

const GMAIL_TWO_ENTRIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><feed version="0.3" xmlns="http://purl.org/atom/ns#"><title>Gmail - Inbox for rlblaster@gmail.com</title>
<tagline>New messages in your Gmail Inbox</tagline>
<fullcount>2</fullcount>
<link rel="alternate" href="https://mail.google.com/mail" type="text/html" />
<modified>2024-05-01T12:00:00Z</modified>
<entry><title>Lunch?</title><summary>Free tomorrow</summary><modified>2024-05-01T11:00:00Z</modified><issued>2024-05-01T11:00:00Z</issued><id>tag:gmail.google.com,2004:1</id><author><name>Alice</name><email>alice@example.com</email></author></entry>
<entry><title>Report</title><summary>Attached</summary><modified>2024-05-01T11:30:00Z</modified><issued>2024-05-01T11:30:00Z</issued><id>tag:gmail.google.com,2004:2</id><author><name>Bob</name><email>bob@example.com</email></author></entry>
</feed>"#;

const NO_ENTRIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Inbox</title>
  <id>tag:mail.example.com,2024:inbox</id>
  <updated>2024-05-01T12:00:00Z</updated>
</feed>"#;

struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn new(test: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("mailcheck_bin_{test}"));
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::fs::remove_file(dir.join("pwd"));
        Self { dir }
    }

    fn password(&self, content: &str) {
        std::fs::write(self.dir.join("pwd"), content).unwrap();
    }

    fn config(&self, feed_url: &str) -> PathBuf {
        let path = self.dir.join("config.toml");
        let content = format!(
            "feed_url = \"{}\"\npassword_file = \"{}\"\ntimeout_secs = 10\n",
            feed_url,
            self.dir.join("pwd").display()
        );
        std::fs::write(&path, content).unwrap();
        path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}

async fn run_binary(config: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mailcheck"))
        .env("MAILCHECK_CONFIG", config)
        .env_remove("RUST_LOG")
        .output()
        .await
        .unwrap()
}

fn assert_silent(output: &Output) {
    assert!(output.stdout.is_empty(), "unexpected stdout: {:?}", output.stdout);
    assert!(output.stderr.is_empty(), "unexpected stderr: {:?}", output.stderr);
}

async fn challenged_feed(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("Authorization", BASIC_SECRET))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Basic realm=\"mail\""))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn new_mail_exits_zero() {
    let server = challenged_feed(THREE_ENTRIES).await;
    let ws = Workspace::new("new_mail");
    ws.password("secret\n");

    let output = run_binary(&ws.config(&format!("{}/feed", server.uri()))).await;
    assert_eq!(output.status.code(), Some(0));
    assert_silent(&output);
}

#[tokio::test]
async fn gmail_feed_exits_zero() {
    let server = challenged_feed(GMAIL_TWO_ENTRIES).await;
    let ws = Workspace::new("gmail");
    ws.password("secret\n");

    let output = run_binary(&ws.config(&format!("{}/feed", server.uri()))).await;
    assert_eq!(output.status.code(), Some(0));
    assert_silent(&output);
}

#[tokio::test]
async fn empty_feed_exits_one() {
    let server = challenged_feed(NO_ENTRIES).await;
    let ws = Workspace::new("empty");
    ws.password("secret");

    let output = run_binary(&ws.config(&format!("{}/feed", server.uri()))).await;
    assert_eq!(output.status.code(), Some(1));
    assert_silent(&output);
}

#[tokio::test]
async fn missing_password_file_exits_one_quietly() {
    let server = challenged_feed(THREE_ENTRIES).await;
    let ws = Workspace::new("no_password");

    let output = run_binary(&ws.config(&format!("{}/feed", server.uri()))).await;
    assert_eq!(output.status.code(), Some(1));
    assert_silent(&output);
}

#[tokio::test]
async fn server_error_exits_one_quietly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let ws = Workspace::new("server_error");
    ws.password("secret");

    let output = run_binary(&ws.config(&format!("{}/feed", server.uri()))).await;
    assert_eq!(output.status.code(), Some(1));
    assert_silent(&output);
}

#[tokio::test]
async fn broken_config_exits_one_quietly() {
    let ws = Workspace::new("broken_config");
    let path = ws.dir.join("config.toml");
    std::fs::write(&path, "feed_url = [unterminated").unwrap();

    let output = run_binary(&path).await;
    assert_eq!(output.status.code(), Some(1));
    assert_silent(&output);
}
