//! One full check-in sweep: resolve, execute, aggregate, deliver.

use std::path::Path;

use color_eyre::eyre::Result;
use tokio::time::{Duration, sleep};

use crate::config::PunchConfig;
use crate::executor;
use crate::registry::Roster;
use crate::report::{self, Outcome};
use crate::session::{Session, TelegramSession};
use crate::{notify, registry};

/// Grace period between report delivery and session teardown, so
/// in-flight gateway work can settle.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Run one check-in sweep end to end.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = PunchConfig::load(config_path)?;
    require_credentials(&config, config_path).await;

    let session = TelegramSession::new(&config.gateway, config.proxy.as_ref())?;
    session.connect(&config.account).await?;

    let roster = snapshot_roster(&session).await?;
    let targets = config.targets();
    eprintln!("[punch] checking in {} target(s)", targets.len());

    // Strictly sequential: one shared session, one target at a time.
    // A session error aborts the remaining loop — no partial report.
    let mut outcomes = Vec::with_capacity(targets.len());
    for target in &targets {
        let outcome = executor::execute(&session, target, &roster).await?;
        outcomes.push(outcome);
    }

    let report = report::aggregate(outcomes);
    let html = report::render_html(&report);

    for line in report::log_lines(&report) {
        eprintln!("[punch] {line}");
    }

    notify::deliver(&session, &config.notify, &html).await;

    eprintln!(
        "[punch] all targets processed — disconnecting in {}s",
        SHUTDOWN_GRACE.as_secs()
    );
    sleep(SHUTDOWN_GRACE).await;

    if let Err(e) = session.disconnect().await {
        eprintln!("[punch] disconnect failed: {e}");
    }

    Ok(())
}

/// Resolve configured targets against the live roster without sending
/// anything, and print what a run would do.
pub async fn targets(config_path: &Path) -> Result<()> {
    let config = PunchConfig::load(config_path)?;
    require_credentials(&config, config_path).await;

    let session = TelegramSession::new(&config.gateway, config.proxy.as_ref())?;
    session.connect(&config.account).await?;

    let roster = snapshot_roster(&session).await?;

    let outcomes: Vec<Outcome> = config
        .targets()
        .iter()
        .map(|target| {
            let contact = roster.lookup(&target.identifier);
            let name = registry::display_name(target, contact);

            if contact.is_none() {
                Outcome::missing_contact(&target.identifier, &name)
            } else if target.command.is_empty() {
                Outcome::missing_command(&target.identifier, &name)
            } else {
                Outcome::skipped(&target.identifier, &name, "dry run — nothing sent")
            }
        })
        .collect();

    let report = report::aggregate(outcomes);
    for line in report::log_lines(&report) {
        println!("{line}");
    }

    Ok(())
}

/// Block forever if the account credentials are missing.
///
/// This is an operator-remediation stop, not an error: the process
/// stays up so a supervisor does not restart-loop it while the config
/// is being filled in.
async fn require_credentials(config: &PunchConfig, config_path: &Path) {
    if config.account.has_credentials() {
        return;
    }

    eprintln!(
        "[punch] account credentials missing — fill in [account] in {}",
        config_path.display()
    );
    eprintln!("[punch] waiting for operator; press Ctrl-C to exit");
    std::future::pending::<()>().await;
}

/// Fetch the roster snapshot. A failure here halts the run before any
/// target is processed.
async fn snapshot_roster(session: &dyn Session) -> Result<Roster> {
    let roster = Roster::new(session.roster().await?);
    eprintln!("[punch] roster snapshot: {} contact(s)", roster.len());
    Ok(roster)
}
