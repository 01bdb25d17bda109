use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let token = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-token <MAINTENANCE_TOKEN>");
        std::process::exit(1);
    });

    if token.trim().is_empty() {
        eprintln!("Refusing to hash an empty token");
        std::process::exit(1);
    }

    match hash(&token, DEFAULT_COST) {
        Ok(hashed) => {
            println!("\nCost     : {}", DEFAULT_COST);
            println!("Hash     : {}\n", hashed);
            println!("# Paste this into your .env and drop MAINTENANCE_TOKEN:");
            println!("MAINTENANCE_TOKEN_HASH={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing token: {}", e);
            std::process::exit(1);
        }
    }
}
