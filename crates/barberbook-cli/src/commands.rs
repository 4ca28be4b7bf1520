use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use barberbook_core::api::ApiError;
use barberbook_core::auth::AuthError;
use barberbook_core::models::{NewAppointment, NewCustomer, Role};
use barberbook_core::utils::{
    format_cpf, format_date_time, format_price, is_valid_email, parse_birth_date, truncate_string,
};

use crate::App;

const SERVICES_ROUTE: &str = "/services";
const APPOINTMENTS_ROUTE: &str = "/agendamento";

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_default(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(value) => {
            let answer = prompt(&format!("{} [{}]", label, value))?;
            Ok(if answer.is_empty() {
                value.to_string()
            } else {
                answer
            })
        }
        None => prompt(label),
    }
}

/// Run the guard for `route`. Returns false (after telling the user where
/// they were sent) when the screen may not be shown.
async fn enter(app: &App, route: &str) -> Result<bool> {
    let landed = app
        .guard
        .settle(route)
        .await
        .ok_or_else(|| anyhow!("navigation to {} did not settle", route))?;

    if landed == route {
        return Ok(true);
    }
    debug!(route, landed = %landed, "guard redirected");
    if landed == app.guard.routes().login() {
        eprintln!("You are not signed in. Run `barberbook login` first.");
    } else {
        eprintln!("Redirected to {}", landed);
    }
    Ok(false)
}

fn report(err: ApiError) -> anyhow::Error {
    if err.is_authorization() {
        anyhow!("{} Run `barberbook login`.", err.user_message())
    } else {
        warn!("request failed: {}", err);
        anyhow::Error::new(err).context("request failed")
    }
}

pub async fn login(app: &mut App, email: Option<&str>) -> Result<()> {
    let login_route = app.guard.routes().login().to_string();
    if !enter(app, &login_route).await? {
        return Ok(());
    }

    let email = match email {
        Some(e) => e.to_string(),
        None => prompt_default("E-mail", app.config.last_email.as_deref())?,
    };
    if !is_valid_email(&email) {
        bail!("'{}' is not a valid e-mail address", email);
    }
    let password = rpassword::prompt_password("Password: ")?;

    match app.session.sign_in(&email, &password).await {
        Ok(credential) => {
            println!("Signed in as {}", credential.user_id);
            app.config.last_email = Some(email);
            if let Err(e) = app.config.save() {
                warn!("could not remember e-mail: {:#}", e);
            }
            Ok(())
        }
        Err(AuthError::Provider(failure)) => {
            bail!("{}", failure.user_message())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn register(app: &App) -> Result<()> {
    if !enter(app, "/cadastro").await? {
        return Ok(());
    }

    let name = prompt("Full name")?;
    let email = prompt("E-mail")?;
    if !is_valid_email(&email) {
        bail!("'{}' is not a valid e-mail address", email);
    }
    let cpf: String = prompt("CPF")?.chars().filter(char::is_ascii_digit).collect();
    if cpf.len() != 11 {
        bail!("CPF must have 11 digits");
    }
    let birth_date = parse_birth_date(&prompt("Birth date (DD/MM/YYYY)")?)
        .context("birth date must be DD/MM/YYYY")?;
    let address = prompt("Address")?;
    let recovery_key = prompt("Recovery key (optional)")?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("passwords do not match");
    }

    let credential = match app.session.register(&email, &password).await {
        Ok(c) => c,
        Err(AuthError::Provider(failure)) => {
            bail!("{}", failure.user_message())
        }
        Err(e) => return Err(e.into()),
    };

    let customer = NewCustomer {
        firebase_uid: credential.user_id.clone(),
        name,
        email,
        password,
        cpf,
        birth_date,
        address,
        recovery_key: (!recovery_key.is_empty()).then_some(recovery_key),
        role: Role::Customer,
    };
    let created = app.api.create_customer(&customer).await.map_err(report)?;
    println!(
        "Welcome, {}! Account created (CPF {}).",
        created.name,
        format_cpf(created.cpf.as_deref().unwrap_or(&customer.cpf))
    );
    Ok(())
}

pub async fn logout(app: &App) -> Result<()> {
    app.session.sign_out().await?;
    println!("Signed out.");
    Ok(())
}

pub async fn reset_password(app: &App, args: &[String]) -> Result<()> {
    let email = args.first().context("usage: barberbook reset-password <email>")?;
    if !is_valid_email(email) {
        bail!("'{}' is not a valid e-mail address", email);
    }
    match app.session.send_password_reset(email).await {
        Ok(()) => {
            println!("Password reset e-mail sent to {}", email);
            Ok(())
        }
        Err(AuthError::Provider(failure)) => {
            bail!("{}", failure.user_message())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn status(app: &App) -> Result<()> {
    match app.session.credential().await {
        Ok(Some(credential)) => println!("Signed in as {}", credential.user_id),
        Ok(None) => println!("Signed out."),
        Err(e) => println!("Signed out (credential store unavailable: {})", e),
    }
    println!("Backend: {}", app.config.api_base_url);
    Ok(())
}

pub async fn open(app: &App, args: &[String]) -> Result<()> {
    let route = args.first().context("usage: barberbook open <route>")?;
    let landed = app
        .guard
        .settle(route)
        .await
        .ok_or_else(|| anyhow!("navigation to {} did not settle", route))?;
    if &landed == route {
        println!("{}", landed);
    } else {
        println!("{} -> {}", route, landed);
    }
    Ok(())
}

pub async fn services(app: &App) -> Result<()> {
    if !enter(app, SERVICES_ROUTE).await? {
        return Ok(());
    }
    let services = app.api.list_services().await.map_err(report)?;
    if services.is_empty() {
        println!("No services available.");
    }
    for service in services.iter().filter(|s| s.is_active) {
        println!(
            "{:<26} {:>12} {:>4} min  {}",
            truncate_string(&service.name, 26),
            format_price(service.price),
            service.duration,
            service.id
        );
    }
    Ok(())
}

pub async fn appointments(app: &App) -> Result<()> {
    if !enter(app, APPOINTMENTS_ROUTE).await? {
        return Ok(());
    }
    let (mut appointments, requests) =
        futures::future::try_join(app.api.list_appointments(), app.api.list_service_requests())
            .await
            .map_err(report)?;
    if appointments.is_empty() {
        println!("No appointments.");
        return Ok(());
    }
    appointments.sort_by_key(|a| a.scheduled_at);
    for appt in &appointments {
        let marker = if appt.is_upcoming() { "*" } else { " " };
        let status = appt.status.map(|s| s.label()).unwrap_or("-");
        let items: u32 = requests
            .iter()
            .filter(|r| r.appointment.id() == appt.id)
            .map(|r| r.quantity)
            .sum();
        println!(
            "{} {}  {:<20} {:<20} {:>12}  {:>2} item(s)  {:<10} {}",
            marker,
            format_date_time(&appt.scheduled_at),
            truncate_string(appt.customer.display(), 20),
            truncate_string(appt.user.display(), 20),
            format_price(appt.total),
            items,
            status,
            appt.id
        );
    }
    Ok(())
}

pub async fn book(app: &App, args: &[String]) -> Result<()> {
    let [customer_id, user_id, when, total] = args else {
        bail!("usage: barberbook book <customer-id> <user-id> <rfc3339> <total>");
    };
    let scheduled_at = DateTime::parse_from_rfc3339(when)
        .with_context(|| format!("'{}' is not an RFC 3339 timestamp", when))?
        .with_timezone(&Utc);
    let total: f64 = total
        .replace(',', ".")
        .parse()
        .with_context(|| format!("'{}' is not a price", total))?;

    if !enter(app, APPOINTMENTS_ROUTE).await? {
        return Ok(());
    }
    let appointment = NewAppointment {
        customer_id: customer_id.clone(),
        user_id: user_id.clone(),
        scheduled_at,
        total,
    };
    let created = app.api.create_appointment(&appointment).await.map_err(report)?;
    println!(
        "Booked {} for {} ({})",
        created.id,
        format_date_time(&created.scheduled_at),
        format_price(created.total)
    );
    Ok(())
}

pub async fn cancel(app: &App, args: &[String]) -> Result<()> {
    let id = args.first().context("usage: barberbook cancel <appointment-id>")?;
    if !enter(app, APPOINTMENTS_ROUTE).await? {
        return Ok(());
    }
    app.api.delete_appointment(id).await.map_err(report)?;
    println!("Cancelled {}", id);
    Ok(())
}
