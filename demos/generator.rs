//! This example generates a CSV file of user actions for a number of users
//! supplied as a command-line argument.
//!
//! The CSV file can then be fed to the `story-ledger` binary or the benchmarks.
//!
//! Example (100 users):
//! ```bash
//! cargo run --example generator 100 > data/100_users.csv
//! ```
//! ### Maths
//! With the default configuration (grant 100, story cost 50, purchase 100) the
//! ending state of every user is known in advance. Per user, in order:
//!
//! 1. two stories: 100 - 2·50 = 0
//! 2. a third story is rejected (insufficient balance), nothing changes
//! 3. one purchase: 0 + 100 = 100
//! 4. one more story: 100 - 50 = 50
//!
//! **Final state for every user:** tokens = 50, stories = 3, and exactly one
//! failed action.
//!
//! Rows are interleaved round by round across users, so every user's actions
//! stay in order while different users' actions mix.

use csv::Writer;
use std::{env, error::Error};
use story_ledger::{ActionType, Request};

const CHARACTERS: [&str; 4] = ["a knight", "a pirate", "a wizard", "a thief"];
const SETTINGS: [&str; 4] = ["a castle", "the open sea", "a tower", "a market"];
const TWISTS: [&str; 4] = ["a storm", "a mutiny", "a lost spell", "a betrayal"];

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: cargo run --example generator <num_users>");
        std::process::exit(1);
    }

    let num_users: u32 = match args[1].parse() {
        Ok(n) if n > 0 => n,
        _ => {
            eprintln!("Error: <num_users> must be a positive integer.");
            std::process::exit(1);
        }
    };

    let rounds = [
        ActionType::Generate,
        ActionType::Generate,
        ActionType::Generate,
        ActionType::Buy,
        ActionType::Generate,
    ];

    let mut wtr = Writer::from_writer(std::io::stdout());
    for (round, action) in rounds.iter().enumerate() {
        for user in 1..=num_users {
            let pick = (round + user as usize) % CHARACTERS.len();
            let request = match action {
                ActionType::Generate => Request {
                    action: ActionType::Generate,
                    user: format!("user-{user:05}"),
                    character: CHARACTERS[pick].to_string(),
                    setting: SETTINGS[pick].to_string(),
                    plot_twist: TWISTS[pick].to_string(),
                },
                ActionType::Buy => Request {
                    action: ActionType::Buy,
                    user: format!("user-{user:05}"),
                    character: String::new(),
                    setting: String::new(),
                    plot_twist: String::new(),
                },
            };
            wtr.serialize(request)?;
        }
    }
    wtr.flush()?;
    Ok(())
}
