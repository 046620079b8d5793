use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use tokio::sync::watch;

use crate::delivery::{self, DeliveryOutcome, DeliveryStatus};
use crate::notify;
use crate::state::SharedState;

/// First instant strictly after `now` that falls on `hour:00` UTC.
pub fn next_run_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        return today;
    }
    now.date_naive()
        .checked_add_days(Days::new(1))
        .map(|d| d.and_time(at).and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Daily report loop. Sleeps until the configured hour, then reports on the
/// previous UTC day. Exits when `shutdown` flips to true.
pub async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>) {
    let hour = state.config.intake.report_hour;
    tracing::info!("Daily report scheduler started ({hour:02}:00 UTC)");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let now = Utc::now();
        let wait = (next_run_after(now, hour) - now)
            .to_std()
            .unwrap_or_default();

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown.changed() => {
                // Sender dropped
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        let yesterday = Utc::now().date_naive() - TimeDelta::days(1);
        match send_daily_report(&state, yesterday).await {
            Ok(outcome) => {
                if let DeliveryStatus::Failed(reason) = &outcome.status {
                    tracing::error!("Daily report for {yesterday} not delivered: {reason}");
                }
            }
            Err(e) => tracing::error!("Daily report for {yesterday} failed: {e}"),
        }

        state.submission_limiter.cleanup();
    }

    tracing::info!("Daily report scheduler stopped");
}

/// Build and send the report for `date` to the admin.
pub async fn send_daily_report(
    state: &SharedState,
    date: NaiveDate,
) -> Result<DeliveryOutcome, String> {
    let stats = state
        .sink
        .daily_stats(date)
        .await
        .map_err(|e| format!("Failed to collect stats: {e}"))?;

    let notification = notify::daily_report(&state.config.business, &stats, date)
        .map_err(|e| format!("Failed to render report: {e}"))?;

    tracing::info!("Sending daily report for {date} ({} inquiries)", stats.total);

    Ok(delivery::deliver(
        state.mailer.as_ref(),
        &notification,
        state.config.intake.send_timeout,
    )
    .await)
}
