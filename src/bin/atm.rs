//! FlashBank ATM
//!
//! Interactive menu client. The signed-in account index is kept here, on the
//! client side, and sent with every deposit and withdrawal.

use anyhow::Context;
use clap::Parser;
use flashbank::client::{BankClient, ClientError};
use rust_decimal::Decimal;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

/// FlashBank ATM client
#[derive(Parser, Debug)]
#[command(name = "flashbank-atm")]
#[command(about = "Interactive client for a FlashBank server")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,
}

struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prints `label` and returns the next non-empty input line, or `None` on EOF.
    async fn ask(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        loop {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(label.as_bytes()).await?;
            stdout.flush().await?;

            match self.lines.next_line().await? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(Some(line.trim().to_string())),
                None => return Ok(None),
            }
        }
    }

    async fn ask_amount(&mut self, label: &str) -> anyhow::Result<Option<Decimal>> {
        while let Some(input) = self.ask(label).await? {
            match Decimal::from_str(&input) {
                Ok(amount) => return Ok(Some(amount)),
                Err(_) => println!("Not a number: {}", input),
            }
        }
        Ok(None)
    }
}

fn print_menu(signed_in: Option<usize>) {
    println!("Select an option:");
    println!("1. Sign in");
    println!("2. Create account");
    if signed_in.is_some() {
        println!("3. Deposit");
        println!("4. Withdraw");
        println!("5. Balance");
    }
    println!("q. Quit");
}

fn report(action: &str, err: ClientError) -> anyhow::Result<()> {
    match err {
        ClientError::Server(reason) => {
            println!("{} failed: {}", action, reason);
            Ok(())
        }
        other => Err(other).with_context(|| format!("{} failed", action)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut client = BankClient::connect(&args.server)
        .await
        .with_context(|| format!("could not connect to {}", args.server))?;
    let mut prompt = Prompt::new();
    let mut account: Option<usize> = None;

    loop {
        print_menu(account);
        let Some(choice) = prompt.ask("> ").await? else {
            break;
        };

        match (choice.as_str(), account) {
            ("q", _) => break,
            ("1", _) => {
                let Some(name) = prompt.ask("Enter name: ").await? else {
                    break;
                };
                let Some(password) = prompt.ask("Enter password: ").await? else {
                    break;
                };
                match client.sign_in(&name, &password).await {
                    Ok(summary) => {
                        println!(
                            "Sign in successful. Account index: {}, Balance: {:.2}",
                            summary.index, summary.balance
                        );
                        account = Some(summary.index);
                    }
                    Err(e) => report("Sign in", e)?,
                }
            }
            ("2", _) => {
                let Some(name) = prompt.ask("Enter new account name: ").await? else {
                    break;
                };
                let Some(password) = prompt.ask("Enter new password: ").await? else {
                    break;
                };
                match client.create_account(&name, &password).await {
                    Ok(()) => println!("Account created successfully."),
                    Err(e) => report("Account creation", e)?,
                }
            }
            ("3", Some(index)) => {
                let Some(amount) = prompt.ask_amount("Enter deposit amount: ").await? else {
                    break;
                };
                match client.deposit(index, amount).await {
                    Ok(balance) => println!("Deposit successful. New balance: {:.2}", balance),
                    Err(e) => report("Deposit", e)?,
                }
            }
            ("4", Some(index)) => {
                let Some(amount) = prompt.ask_amount("Enter withdrawal amount: ").await? else {
                    break;
                };
                match client.withdraw(index, amount).await {
                    Ok(balance) => println!("Withdrawal successful. New balance: {:.2}", balance),
                    Err(e) => report("Withdrawal", e)?,
                }
            }
            ("5", Some(index)) => match client.balance(index).await {
                Ok(balance) => println!("Balance: {:.2}", balance),
                Err(e) => report("Balance", e)?,
            },
            _ => println!("Invalid choice or operation unavailable."),
        }
    }

    println!("Exiting client.");
    Ok(())
}
