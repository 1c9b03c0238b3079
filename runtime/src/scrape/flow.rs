use super::{ScrapeOptions, ScrapeOutput, Stage};
use crate::error::{RunError, ScrapeError};
use crate::extraction::deep::{deep_first, DeepNode, NodeQuery};
use crate::live::act::{deep_click, deep_click_parent, deep_fill};
use crate::live::session::Session;
use crate::live::wait::await_condition;
use crate::portal::PortalProfile;
use anyhow::anyhow;
use genrelay::parse::{
    looks_like_date, parse_battery_voltage, parse_display_timestamp_at, parse_runtime_hours,
};
use genrelay::TelemetryRecord;
use std::time::Instant;
use tracing::{debug, info};

/// Drives one session through the portal.
pub struct Scraper<'a> {
    session: &'a mut Session,
    profile: &'a PortalProfile,
    options: &'a ScrapeOptions,
    stage: Stage,
}

impl<'a> Scraper<'a> {
    pub fn new(
        session: &'a mut Session,
        profile: &'a PortalProfile,
        options: &'a ScrapeOptions,
    ) -> Self {
        Self {
            session,
            profile,
            options,
            stage: Stage::Start,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run to [`Stage::Done`] or [`Stage::Failed`]. The error carries the
    /// stage that was active when things went wrong.
    pub async fn run(&mut self) -> Result<ScrapeOutput, RunError> {
        let started = Instant::now();
        match self.drive().await {
            Ok(output) => {
                self.enter(Stage::Done);
                info!(
                    session = %self.session.id,
                    elapsed = ?started.elapsed(),
                    runtime_hours = output.record.runtime_hours,
                    battery_voltage = output.record.battery_voltage,
                    last_exercise = %output.record.last_exercise.to_rfc3339(),
                    "extraction complete"
                );
                Ok(output)
            }
            Err(source) => {
                let stage = self.stage;
                self.stage = Stage::Failed;
                Err(RunError { stage, source })
            }
        }
    }

    async fn drive(&mut self) -> Result<ScrapeOutput, ScrapeError> {
        self.enter(Stage::Authenticating);
        self.sign_in().await.map_err(as_auth_failure)?;

        self.enter(Stage::NavigatingDashboard);
        self.open_dashboard().await?;

        self.enter(Stage::ExtractingMetrics);
        let runtime_hours = self.read_runtime_hours().await?;
        let battery_voltage = self.read_battery_voltage().await?;

        self.enter(Stage::NavigatingEvents);
        self.open_events().await?;

        self.enter(Stage::ExtractingExerciseDate);
        let last_exercise = self.read_last_exercise().await?;

        self.enter(Stage::Serializing);
        let record = TelemetryRecord::builder()
            .runtime_hours(runtime_hours)
            .battery_voltage(battery_voltage)
            .last_exercise(last_exercise)
            .captured_now()
            .build()?;
        let line = record.to_payload_line()?;
        Ok(ScrapeOutput { record, line })
    }

    fn enter(&mut self, next: Stage) {
        debug_assert!(!self.stage.is_terminal() && next > self.stage, "{} -> {next}", self.stage);
        info!(session = %self.session.id, from = %self.stage, to = %next, "stage");
        self.stage = next;
    }

    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        let bound = self.options.nav_timeout;
        let ctx = self.session.context_mut();
        let nav = tokio::time::timeout(bound, ctx.navigate(url, bound.as_millis() as u64))
            .await
            .map_err(|_| ScrapeError::browser(anyhow!("navigation to {url} timed out after {bound:?}")))?
            .map_err(ScrapeError::browser)?;
        info!(url, final_url = %nav.final_url, load_ms = nav.load_time_ms, "page loaded");
        Ok(())
    }

    async fn wait_for(&self, query: &NodeQuery) -> Result<DeepNode, ScrapeError> {
        let ctx = self.session.context();
        let node = await_condition(
            &query.to_string(),
            self.options.wait_timeout,
            self.options.poll_interval,
            || deep_first(ctx, query),
        )
        .await?;
        debug!(query = %query, tag = %node.tag, depth = node.depth, "found");
        Ok(node)
    }

    async fn sign_in(&mut self) -> Result<(), ScrapeError> {
        let profile = self.profile;
        let pacing = self.options.pacing;
        self.navigate(&profile.entry_url).await?;

        let ctx = self.session.context();
        let control = self.wait_for(&profile.sign_in()).await?;
        info!(tag = %control.tag, text = %control.own_text, "sign-in control found");
        deep_click_parent(ctx, &control).await?;
        pacing.settle().await;

        let credentials = &self.options.credentials;
        let username = self.wait_for(&profile.username_input()).await?;
        deep_fill(ctx, &username, &credentials.username).await?;
        pacing.between_actions().await;

        let password = self.wait_for(&profile.password_input()).await?;
        deep_fill(ctx, &password, &credentials.password).await?;
        pacing.between_actions().await;

        let submit = self.wait_for(&profile.submit_button()).await?;
        deep_click(ctx, &submit).await?;
        info!("credentials submitted");

        match self.wait_for(&profile.section(&profile.maintenance_section)).await {
            Ok(_) => {
                match ctx.get_url().await {
                    Ok(url) => info!(url = %url, "signed in"),
                    Err(e) => {
                        debug!("reading landing url: {e:#}");
                        info!("signed in");
                    }
                }
                Ok(())
            }
            Err(ScrapeError::Timeout { waited, .. }) => Err(ScrapeError::Auth(format!(
                "no dashboard {waited:?} after submitting credentials (rejected?)"
            ))),
            Err(e) => Err(e),
        }
    }

    async fn open_dashboard(&mut self) -> Result<(), ScrapeError> {
        let profile = self.profile;
        if let Some(url) = &profile.dashboard_url {
            self.navigate(url).await?;
        }
        self.open_section(&profile.maintenance_section).await
    }

    async fn open_section(&self, name: &str) -> Result<(), ScrapeError> {
        let pulldown = self.wait_for(&self.profile.section(name)).await?;
        deep_click(self.session.context(), &pulldown).await?;
        info!(section = name, "section opened");
        self.options.pacing.settle().await;
        Ok(())
    }

    async fn read_runtime_hours(&self) -> Result<f64, ScrapeError> {
        let node = self.wait_for(&self.profile.runtime_reading()).await?;
        let hours = parse_runtime_hours(&node.inner_text)?;
        info!(raw = %node.inner_text, runtime_hours = hours, "runtime read");
        Ok(hours)
    }

    async fn read_battery_voltage(&self) -> Result<f64, ScrapeError> {
        self.open_section(&self.profile.generator_data_section).await?;
        let label = self.wait_for(&self.profile.battery_label()).await?;
        // the reading sits next to the label, inside the same parent
        let around = label.parent_text.as_deref().unwrap_or(&label.text);
        let volts = parse_battery_voltage(around)?;
        info!(battery_voltage = volts, "battery voltage read");
        Ok(volts)
    }

    async fn open_events(&self) -> Result<(), ScrapeError> {
        self.open_section(&self.profile.notifications_section).await?;
        let tab = self.wait_for(&self.profile.tab(&self.profile.events_tab)).await?;
        deep_click(self.session.context(), &tab).await?;
        info!(tab = %tab.own_text, "events tab opened");
        self.options.pacing.settle().await;
        Ok(())
    }

    async fn read_last_exercise(&self) -> Result<chrono::DateTime<chrono::FixedOffset>, ScrapeError> {
        let ctx = self.session.context();
        let query = &self.profile.exercise_entry();
        let raw = await_condition(
            &format!("a dated entry after {query}"),
            self.options.wait_timeout,
            self.options.poll_interval,
            || async move {
                let Some(entry) = deep_first(ctx, query).await? else {
                    return Ok(None);
                };
                match entry.next_sibling_text {
                    Some(text) if looks_like_date(&text) => Ok(Some(text)),
                    Some(text) => Err(ScrapeError::Script {
                        what: "exercise entry".to_string(),
                        detail: format!("{text:?} does not look like a date"),
                    }),
                    None => Ok(None),
                }
            },
        )
        .await?;
        let at = parse_display_timestamp_at(&raw, self.profile.display_offset)?;
        info!(raw = %raw, last_exercise = %at.to_rfc3339(), "exercise date read");
        Ok(at)
    }
}

/// Anything but a transport failure while signing in is an authentication
/// failure.
fn as_auth_failure(err: ScrapeError) -> ScrapeError {
    match err {
        ScrapeError::Timeout { .. } | ScrapeError::Script { .. } => {
            ScrapeError::Auth(err.to_string())
        }
        other => other,
    }
}
