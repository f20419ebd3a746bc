//! Share2Go - command-line client

use anyhow::Result;
use chrono::Local;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use share2go::{
    api::{ApiClient, PageRequest},
    config::Config,
    models::UserRole,
    services::{Navigator, SessionManager},
    storage::create_store,
};

const USAGE: &str = "\
Usage: share2go <command>

Commands:
  whoami                   Show the current session (default)
  login <email> <password> Log in and persist the session
  logout                   Log out and clear the persisted session
  visit <path>             Show where a page request ends up
  dashboard                Show the counters of your dashboard
  rides                    List published rides
  notifications            Show your unread notification count";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "share2go=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::load_with_env(Path::new("share2go.yml"))?;
    tracing::debug!("Configuration loaded, backend at {}", config.api.base_url);

    // Restore the persisted session
    let store = create_store(&config.storage).await?;
    let session = SessionManager::from_config(store, &config.session);
    let state = session.resolve_from_storage().await;
    tracing::debug!("Session restored: {}", state);

    let client = ApiClient::new(&config.api, session.clone())?;
    let navigator = Navigator::new(session.clone());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] | ["whoami"] => match session.current_identity().await {
            Some(identity) => println!(
                "{} <{}> - {} (id {})",
                identity.display_name(),
                identity.email,
                identity.role,
                identity.id
            ),
            None => println!("Not logged in"),
        },
        ["login", email, password] => {
            let identity = client.login(email, password).await?;
            println!("Welcome, {}! Home: {}", identity.display_name(), identity.role.home_path());
        }
        ["logout"] => {
            client.logout().await;
            println!("Logged out");
        }
        ["visit", path] => {
            let navigation = navigator.navigate(path).await;
            println!("{} -> {}", navigation.requested, navigation.destination());
        }
        ["dashboard"] => {
            let Some(identity) = session.current_identity().await else {
                println!("Not logged in -> /login");
                return Ok(());
            };
            let now = Local::now().naive_local();
            match identity.role {
                UserRole::Driver => {
                    let (rides, stats) = client.driver_dashboard(&identity.id, now).await?;
                    println!("Rides: {} ({} active)", stats.total_rides, stats.active_rides);
                    println!("Passengers: {}", stats.total_passengers);
                    println!("Pending requests: {}", stats.pending_requests);
                    println!("Earnings: {:.2}", stats.total_earnings);
                    for ride in rides {
                        println!("  #{} {} -> {} at {}", ride.id, ride.origin, ride.destination, ride.departure_time);
                    }
                }
                UserRole::Passenger => {
                    let (_, stats) = client.passenger_dashboard(&identity.id, now).await?;
                    println!("Bookings: {}", stats.total_bookings);
                    println!("Upcoming: {}", stats.upcoming_rides);
                    println!("Completed: {}", stats.completed_rides);
                    println!("Spent: {:.2}", stats.total_spent);
                }
            }
        }
        ["rides"] => {
            for ride in client.list_rides(PageRequest::default()).await? {
                println!(
                    "#{} {} -> {} at {} ({} seats, {:.2}/seat)",
                    ride.id,
                    ride.origin,
                    ride.destination,
                    ride.departure_time,
                    ride.available_seats,
                    ride.price_per_seat
                );
            }
        }
        ["notifications"] => {
            let Some(identity) = session.current_identity().await else {
                println!("Not logged in -> /login");
                return Ok(());
            };
            let unread = client.unread_count(&identity.id).await?;
            println!("{} unread notification(s)", unread);
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}
