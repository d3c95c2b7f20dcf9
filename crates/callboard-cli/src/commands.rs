//! Command execution.
//!
//! Every command that needs a signed-in user goes through the same guards as
//! the dashboard views, and every resource call is tracked so a rejected
//! token ends the stored session.

use anyhow::{bail, Context};
use serde_json::Value;

use callboard_client::UserUpdate;
use callboard_core::{access, Role, UserId, UserProfile};
use callboard_session::guard::{self, GuardDecision, Route};
use callboard_session::{AuthResult, SessionContext};

use crate::{Command, Report, UsersAction};

/// Execute one command against a resolved session.
pub(crate) async fn run(session: &SessionContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => login(session, &email, &password).await,
        Command::Register {
            email,
            password,
            name,
            phone,
        } => {
            let result = session.register(&email, &password, &name, &phone).await;
            report_auth(session, result)
        }
        Command::PhoneStart { email, phone } => {
            let ack = session
                .start_phone_verification(&email, phone.as_deref())
                .await?;
            println!("{}", ack.message.as_deref().unwrap_or("Verification code sent."));
            Ok(())
        }
        Command::PhoneVerify { email, code } => {
            let ack = session.verify_phone(&email, &code).await?;
            println!("{}", ack.message.as_deref().unwrap_or("Phone verified."));
            Ok(())
        }
        Command::Logout => {
            session.logout();
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            let user = require(session, Role::User)?;
            print_user(&user);
            Ok(())
        }
        Command::Agents { id } => {
            require(session, Role::User)?;
            let agents = session.api().agents();
            let value = match id {
                Some(id) => session.track(agents.get(&id).await)?,
                None => session.track(agents.list(&[]).await)?,
            };
            print_json(&value)
        }
        Command::Calls { agent, limit } => {
            require(session, Role::User)?;
            let limit = limit.map(|l| l.to_string());
            let params: Vec<(&str, &str)> = limit.iter().map(|l| ("limit", l.as_str())).collect();
            let calls = session.api().calls();
            let value = match agent {
                Some(agent) => session.track(calls.history(&agent, &params).await)?,
                None => session.track(calls.list(&params).await)?,
            };
            print_json(&value)
        }
        Command::Leads => {
            require(session, Role::User)?;
            let value = session.track(session.api().leads().list(&[]).await)?;
            print_json(&value)
        }
        Command::Analytics { report, period } => {
            require(session, Role::User)?;
            let params: Vec<(&str, &str)> =
                period.iter().map(|p| ("period", p.as_str())).collect();
            let analytics = session.api().analytics();
            let result = match report {
                Report::Overview => analytics.overview(&params).await,
                Report::Agents => analytics.agents(&params).await,
                Report::Calls => analytics.calls(&params).await,
                Report::Sentiment => analytics.sentiment(&params).await,
            };
            print_json(&session.track(result)?)
        }
        Command::Stats => {
            require(session, Role::User)?;
            let value = session.track(session.api().utility().stats().await)?;
            print_json(&value)
        }
        Command::Sync => sync(session).await,
        Command::Search { query } => {
            require(session, Role::User)?;
            let search = session.api().search();
            let calls = session.track(search.calls(&query, &[]).await)?;
            let agents = session.track(search.agents(&query, &[]).await)?;
            print_json(&serde_json::json!({ "calls": calls, "agents": agents }))
        }
        Command::Users { action } => users(session, action).await,
    }
}

async fn login(session: &SessionContext, email: &str, password: &str) -> anyhow::Result<()> {
    if guard::login_gate(&session.snapshot()) == GuardDecision::Redirect(Route::Dashboard) {
        if let Some(user) = session.user() {
            println!("Already signed in as {}.", user.display_name());
        }
        return Ok(());
    }

    let result = session.login(email, password).await;
    report_auth(session, result)
}

fn report_auth(session: &SessionContext, result: AuthResult) -> anyhow::Result<()> {
    match result {
        AuthResult::Authenticated => {
            if let Some(user) = session.user() {
                println!("Signed in as {} ({}).", user.display_name(), user.role);
            }
            Ok(())
        }
        AuthResult::Pending { message } => {
            println!("{message}");
            Ok(())
        }
        AuthResult::Failure { error } => bail!(error),
    }
}

async fn sync(session: &SessionContext) -> anyhow::Result<()> {
    require(session, Role::User)?;
    let report = session.api().sync_all().await;
    let complete = report.is_complete();

    for (name, result) in [("agents", report.agents), ("calls", report.calls)] {
        match session.track(result) {
            Ok(_) => println!("{name}: synced"),
            Err(e) => println!("{name}: {}", e.message()),
        }
    }

    if !complete {
        bail!("sync incomplete");
    }
    Ok(())
}

async fn users(session: &SessionContext, action: UsersAction) -> anyhow::Result<()> {
    let actor = match guard::route("/dashboard/users", &session.snapshot()) {
        GuardDecision::Render => require(session, Role::Admin)?,
        GuardDecision::Redirect(Route::Login) | GuardDecision::Loading => {
            bail!("Not signed in. Run `callboard login` first.")
        }
        GuardDecision::Redirect(Route::Dashboard) => bail!("User management requires an admin."),
    };
    let users = session.api().users();

    match action {
        UsersAction::List { status } => {
            let params: Vec<(&str, &str)> =
                status.iter().map(|s| ("status", s.as_str())).collect();
            print_json(&session.track(users.list(&params).await)?)
        }
        UsersAction::Approve { id } => {
            let id: UserId = id.parse()?;
            let target = fetch_profile(session, &id).await?;
            if !access::can_approve_user(&actor, &target) {
                bail!("Only super admins can approve pending accounts.");
            }
            print_json(&session.track(users.approve(&id).await)?)
        }
        UsersAction::SetRole { id, role } => {
            let id: UserId = id.parse()?;
            let role: Role = role.parse()?;
            let target = fetch_profile(session, &id).await?;
            if !access::can_change_role(&actor, &target) || !access::can_grant_role(&actor, role)
            {
                bail!("You cannot give {} the {role} role.", target.display_name());
            }
            let update = UserUpdate {
                role: Some(role),
                ..UserUpdate::default()
            };
            print_json(&session.track(users.update(&id, &update).await)?)
        }
    }
}

async fn fetch_profile(session: &SessionContext, id: &UserId) -> anyhow::Result<UserProfile> {
    let value = session.track(session.api().users().get(id).await)?;
    let data = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(data).with_context(|| format!("unexpected user record for {id}"))
}

fn require(session: &SessionContext, role: Role) -> anyhow::Result<UserProfile> {
    match guard::require_role(&session.snapshot(), role) {
        GuardDecision::Render => session.user().context("Not signed in"),
        GuardDecision::Redirect(Route::Dashboard) => {
            bail!("This command requires the {role} role.")
        }
        GuardDecision::Redirect(Route::Login) | GuardDecision::Loading => {
            bail!("Not signed in. Run `callboard login` first.")
        }
    }
}

fn print_user(user: &UserProfile) {
    println!("{}", user.display_name());
    println!("  email:  {}", user.email);
    println!("  role:   {}", user.role);
    if let Some(status) = user.status {
        println!("  status: {status}");
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
