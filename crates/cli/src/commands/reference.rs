//! Reference data listing commands.
//!
//! Each command prints one entry per line to stdout.

use super::{CliError, Environment};

/// Print `CODE<TAB>Name` for every country.
#[allow(clippy::print_stdout)]
pub async fn countries() -> Result<(), CliError> {
    let env = Environment::load()?;
    let countries = env.reference_data()?.countries().await?;

    tracing::debug!(count = countries.len(), "Countries loaded");
    for country in countries {
        println!("{}\t{}", country.code, country.name);
    }
    Ok(())
}

/// Print the states of `country_code`.
#[allow(clippy::print_stdout)]
pub async fn states(country_code: &str) -> Result<(), CliError> {
    let env = Environment::load()?;
    let states = env.reference_data()?.states(country_code).await?;

    if states.is_empty() {
        tracing::info!(country_code, "Country has no states");
    }
    for state in states {
        println!("{}\t{}", state.code, state.name);
    }
    Ok(())
}

/// Print the selectable expiration months for `year`.
///
/// For the current year (or no year) the list starts at the current month.
#[allow(clippy::print_stdout)]
pub async fn card_months(year: Option<i32>) -> Result<(), CliError> {
    let env = Environment::load()?;
    let start_month = match year {
        Some(year) if year != env.clock.current_year() => 1,
        _ => env.clock.current_month(),
    };

    for month in env.reference_data()?.credit_card_months(start_month).await? {
        println!("{month:02}");
    }
    Ok(())
}

/// Print the selectable expiration years.
#[allow(clippy::print_stdout)]
pub async fn card_years() -> Result<(), CliError> {
    let env = Environment::load()?;
    for year in env.reference_data()?.credit_card_years().await? {
        println!("{year}");
    }
    Ok(())
}
