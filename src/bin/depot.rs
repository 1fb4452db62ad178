//! Interactive depot client.
//!
//! Menu-driven: list the repository, download into `downloads/`, upload
//! from `uploads/`, request publication, exit. Server address comes from
//! the first CLI argument (default `127.0.0.1:8080`).

use depot_protocol::error::Result;
use depot_protocol::protocol::command::wire;
use depot_protocol::service::DepotClient;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const DOWNLOAD_DIR: &str = "downloads";
const UPLOAD_DIR: &str = "uploads";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("depot: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tokio::fs::create_dir_all(DOWNLOAD_DIR).await?;
    tokio::fs::create_dir_all(UPLOAD_DIR).await?;

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let mut client = DepotClient::connect(&addr).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("Username: ");
    let user = read_line(&mut input).await?;
    println!("Password: ");
    let pass = read_line(&mut input).await?;

    if client.login(&user, &pass).await.is_err() {
        println!("Login failed.");
        return Ok(());
    }
    println!("Login success!");

    loop {
        println!();
        println!("1) LIST");
        println!("2) DOWNLOAD");
        println!("3) UPLOAD");
        println!("4) REQUEST PUBLISH");
        println!("5) EXIT");
        println!("> ");

        match read_line(&mut input).await?.as_str() {
            "1" => {
                println!();
                println!("Repository files:");
                for name in client.list().await? {
                    println!(" - {name}");
                }
            }
            "2" => {
                println!("File to download: ");
                let name = read_line(&mut input).await?;
                match client.get(&name).await {
                    Ok(content) => {
                        let dest = Path::new(DOWNLOAD_DIR).join(&name);
                        tokio::fs::write(&dest, &content).await?;
                        println!("Saved {} bytes to {}", content.len(), dest.display());
                    }
                    Err(_) => println!("File not found."),
                }
            }
            "3" => {
                println!("Local file in {UPLOAD_DIR}/ to upload: ");
                let name = read_line(&mut input).await?;
                let src = Path::new(UPLOAD_DIR).join(&name);
                match tokio::fs::read(&src).await {
                    Ok(content) => {
                        let reply = client.put(&name, &content).await?;
                        println!("{reply}");
                    }
                    Err(_) => println!("File not found in {UPLOAD_DIR}/."),
                }
            }
            "4" => {
                println!("File in {UPLOAD_DIR}/ to publish: ");
                let name = read_line(&mut input).await?;
                match client.request_publish(&name).await?.as_str() {
                    wire::APPROVED => println!("Approved & published!"),
                    wire::DENIED => println!("Operator denied."),
                    other => println!("Server: {other}"),
                }
            }
            "5" => {
                client.exit().await?;
                return Ok(());
            }
            _ => println!("Invalid choice."),
        }
    }
}

async fn read_line(input: &mut Lines<BufReader<Stdin>>) -> Result<String> {
    Ok(input.next_line().await?.unwrap_or_default())
}
