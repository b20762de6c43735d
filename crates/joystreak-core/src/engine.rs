//! The progression engine: orchestration and the single transactional
//! apply path.
//!
//! Every entry point -- event processing, coin claims, class selection,
//! and the admin overrides -- funnels through [`ProgressionEngine::apply`]:
//! load-with-version, compute the new state with the pure policy and
//! leveling modules, re-derive the `level`/`hp` invariants, then
//! compare-and-swap. A version conflict or transient store failure
//! retries within a bounded budget; domain rejections happen before any
//! write, so a failed operation never leaves partial state.
//!
//! The engine holds only its immutable configuration and the store
//! handle. There is no process-wide mutable state.

use std::time::Duration;

use chrono::{DateTime, Utc};

use joystreak_types::{
    ChannelKind, CharacterClass, ClaimOutcome, ClassOutcome, GrantOutcome, GuildId, ResetReport,
    RewardOutcome, UserId, UserProgression, UserResetOutcome,
};

use crate::clock::EpochResolver;
use crate::config::ProgressionConfig;
use crate::error::EngineError;
use crate::leveling::LevelCurve;
use crate::policy::{self, RewardDecision};
use crate::store::{CasResult, CreateResult, INITIAL_VERSION, ProgressionStore, StoreError};

/// The daily progression engine.
///
/// Generic over the storage backend; see
/// [`ProgressionStore`](crate::store::ProgressionStore).
#[derive(Debug)]
pub struct ProgressionEngine<S> {
    store: S,
    config: ProgressionConfig,
    resolver: EpochResolver,
    curve: LevelCurve,
}

impl<S: ProgressionStore> ProgressionEngine<S> {
    /// Construct an engine from a store handle and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the configuration is
    /// invalid -- an unknown time zone or a malformed reward table.
    /// This is the fatal startup check; nothing past this point
    /// re-validates configuration.
    pub fn new(store: S, config: ProgressionConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let resolver = EpochResolver::new(&config.time.timezone)?;
        let curve = LevelCurve::from_config(&config)?;
        Ok(Self {
            store,
            config,
            resolver,
            curve,
        })
    }

    /// The active configuration.
    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// The active leveling curve (for progress display by the caller).
    pub const fn curve(&self) -> &LevelCurve {
        &self.curve
    }

    /// Read a user's current record without mutating anything.
    ///
    /// Returns `None` if the user has no record yet.
    pub async fn fetch(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<UserProgression>, EngineError> {
        Ok(self
            .store
            .get(guild, user)
            .await?
            .map(|(record, _version)| record))
    }

    /// Process one qualifying-action event.
    ///
    /// Resolves the event's epoch day under the configured zone,
    /// evaluates the reward policy, and commits the resulting delta.
    ///
    /// # Errors
    ///
    /// [`EngineError::StaleEvent`] for out-of-order delivery,
    /// [`EngineError::ConcurrencyExhausted`] when the retry budget runs
    /// out, [`EngineError::StoreUnavailable`] when the store stays down.
    pub async fn process_qualifying_event(
        &self,
        guild: GuildId,
        user: UserId,
        timestamp: DateTime<Utc>,
        channel: ChannelKind,
    ) -> Result<RewardOutcome, EngineError> {
        let event_day = self.resolver.epoch_day(timestamp);
        let unlock = self.curve.unlock_level();

        let outcome = self
            .apply(guild, user, |current| {
                let decision = policy::evaluate(current, event_day, channel, &self.config)?;
                let mut next = current.clone();
                let old_level = current.level;

                let (penalty, streak_broken, missed_day, milestone) = match decision {
                    RewardDecision::Penalty { xp_loss } => {
                        next.xp = next.xp.saturating_sub(xp_loss);
                        (true, false, false, false)
                    }
                    RewardDecision::StreakBroken { previous_streak: _ } => {
                        next.streak = 0;
                        (false, true, false, false)
                    }
                    RewardDecision::RepeatNoop => (false, false, false, false),
                    RewardDecision::Credit {
                        new_streak,
                        xp_gain,
                        missed_day_xp_loss,
                        missed_day,
                        milestone,
                    } => {
                        next.xp = next.xp.saturating_sub(missed_day_xp_loss).saturating_add(xp_gain);
                        next.streak = new_streak;
                        next.last_qualifying_day = Some(event_day);
                        next.last_action_day = Some(event_day);
                        (false, false, missed_day, milestone)
                    }
                };

                let new_level = self.curve.level_for(next.xp);
                let outcome = RewardOutcome {
                    xp_delta: signed_delta(current.xp, next.xp),
                    new_level,
                    leveled_up: new_level > old_level,
                    streak: next.streak,
                    penalty,
                    streak_broken,
                    missed_day,
                    milestone,
                    class_unlocked: old_level < unlock && new_level >= unlock,
                };
                Ok((next, outcome))
            })
            .await?;

        if outcome.leveled_up {
            tracing::info!(
                %guild,
                %user,
                level = outcome.new_level,
                "User leveled up"
            );
        }
        Ok(outcome)
    }

    /// Claim the once-per-day coin reward.
    ///
    /// Credits `coins_per_level * level` coins.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyClaimed`] if a claim was already recorded
    /// for the timestamp's epoch day.
    pub async fn claim_daily_coins(
        &self,
        guild: GuildId,
        user: UserId,
        timestamp: DateTime<Utc>,
    ) -> Result<ClaimOutcome, EngineError> {
        let claim_day = self.resolver.epoch_day(timestamp);
        self.apply(guild, user, |current| {
            if current.last_claim_day == Some(claim_day) {
                return Err(EngineError::AlreadyClaimed { claim_day });
            }
            let earned = self
                .config
                .rewards
                .coins_per_level
                .saturating_mul(u64::from(current.level));
            let mut next = current.clone();
            next.coins = next.coins.saturating_add(earned);
            next.last_claim_day = Some(claim_day);
            let outcome = ClaimOutcome {
                coins_earned: earned,
                total_coins: next.coins,
                level: current.level,
            };
            Ok((next, outcome))
        })
        .await
    }

    /// Select a character class (one-time, level-gated).
    ///
    /// # Errors
    ///
    /// [`EngineError::GateNotMet`] below the unlock level,
    /// [`EngineError::AlreadySelected`] if a class is already set.
    pub async fn select_class(
        &self,
        guild: GuildId,
        user: UserId,
        class: CharacterClass,
    ) -> Result<ClassOutcome, EngineError> {
        let required = self.curve.unlock_level();
        let outcome = self
            .apply(guild, user, |current| {
                if let Some(existing) = current.class {
                    return Err(EngineError::AlreadySelected { class: existing });
                }
                if current.level < required {
                    return Err(EngineError::GateNotMet {
                        level: current.level,
                        required,
                    });
                }
                let mut next = current.clone();
                next.class = Some(class);
                let outcome = ClassOutcome {
                    class,
                    hp: self.curve.hp_for(current.level, Some(class)),
                };
                Ok((next, outcome))
            })
            .await?;

        tracing::info!(%guild, %user, class = %outcome.class, "Class selected");
        Ok(outcome)
    }

    /// Admin override: clear the daily gates without touching progress.
    ///
    /// Clears `last_action_day` (allowing the qualifying action again)
    /// and `last_claim_day` (allowing another coin claim). Streak, XP,
    /// level, HP, coins, and class are untouched.
    pub async fn force_new_day(&self, guild: GuildId, user: UserId) -> Result<(), EngineError> {
        self.apply(guild, user, |current| {
            let mut next = current.clone();
            next.last_action_day = None;
            next.last_claim_day = None;
            Ok((next, ()))
        })
        .await?;
        tracing::info!(%guild, %user, "Daily gates cleared by admin");
        Ok(())
    }

    /// Admin override: grant XP and/or coins. Additive only; reductions
    /// go through [`reset_user`](ProgressionEngine::reset_user).
    pub async fn grant(
        &self,
        guild: GuildId,
        user: UserId,
        xp: u64,
        coins: u64,
    ) -> Result<GrantOutcome, EngineError> {
        let outcome = self
            .apply(guild, user, |current| {
                let mut next = current.clone();
                next.xp = next.xp.saturating_add(xp);
                next.coins = next.coins.saturating_add(coins);
                let new_level = self.curve.level_for(next.xp);
                let outcome = GrantOutcome {
                    xp: next.xp,
                    new_level,
                    leveled_up: new_level > current.level,
                    coins: next.coins,
                };
                Ok((next, outcome))
            })
            .await?;

        tracing::info!(%guild, %user, xp, coins, "Admin grant applied");
        Ok(outcome)
    }

    /// Admin override: restore one user to creation defaults.
    ///
    /// Destructive; clears XP, streak, coins, class, and all day
    /// fields. The record itself remains (at its reset state), so the
    /// version history keeps advancing.
    pub async fn reset_user(&self, guild: GuildId, user: UserId) -> Result<(), EngineError> {
        self.apply(guild, user, |_current| {
            Ok((UserProgression::new(guild, user), ()))
        })
        .await?;
        tracing::info!(%guild, %user, "User progression reset by admin");
        Ok(())
    }

    /// Admin override: reset every user in a guild.
    ///
    /// Transactional per user: one user's failure is recorded in the
    /// report and never aborts the rest of the batch.
    pub async fn reset_guild(&self, guild: GuildId) -> Result<ResetReport, EngineError> {
        let users = self.store.list_users(guild).await?;
        let mut report = ResetReport::default();
        for user in users {
            let error = self.reset_user(guild, user).await.err();
            if let Some(err) = &error {
                tracing::warn!(%guild, %user, %err, "Bulk reset entry failed");
            }
            report.outcomes.push(UserResetOutcome {
                user_id: user,
                error: error.map(|e| e.to_string()),
            });
        }
        tracing::info!(
            %guild,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Guild progression reset by admin"
        );
        Ok(report)
    }

    /// Re-derive the persisted invariants from the record's own state.
    ///
    /// Runs on every record before it is written, including the lazily
    /// created default, so `level == level_for(xp)` and
    /// `hp == hp_for(level, class)` hold after every transaction.
    fn normalize(&self, record: &mut UserProgression) {
        record.level = self.curve.level_for(record.xp);
        record.hp = self.curve.hp_for(record.level, record.class);
    }

    /// The single transactional apply path.
    ///
    /// Load-with-version (lazily creating the default record), run the
    /// operation against the current state, normalize, and
    /// compare-and-swap. Version conflicts retry immediately; transient
    /// store failures retry with linear backoff. Both share one bounded
    /// attempt budget.
    async fn apply<T, F>(&self, guild: GuildId, user: UserId, mut op: F) -> Result<T, EngineError>
    where
        F: FnMut(&UserProgression) -> Result<(UserProgression, T), EngineError>,
    {
        let max_attempts = self.config.retry.max_attempts;
        let mut attempt = 0_u32;
        loop {
            attempt = attempt.saturating_add(1);

            let loaded = match self.store.get(guild, user).await {
                Ok(loaded) => loaded,
                Err(err) => {
                    self.note_store_failure(&err, attempt, max_attempts).await?;
                    continue;
                }
            };

            let (current, version) = match loaded {
                Some(pair) => pair,
                None => {
                    let mut fresh = UserProgression::new(guild, user);
                    self.normalize(&mut fresh);
                    match self.store.create(&fresh).await {
                        Ok(CreateResult::Created) => {
                            tracing::debug!(%guild, %user, "Created progression record");
                            (fresh, INITIAL_VERSION)
                        }
                        Ok(CreateResult::AlreadyExists) => {
                            // Lost a creation race; reload and retry.
                            continue;
                        }
                        Err(err) => {
                            self.note_store_failure(&err, attempt, max_attempts).await?;
                            continue;
                        }
                    }
                }
            };

            // Domain rejections surface here, before any write.
            let (mut next, outcome) = op(&current)?;
            self.normalize(&mut next);

            match self.store.compare_and_swap(version, &next).await {
                Ok(CasResult::Applied) => return Ok(outcome),
                Ok(CasResult::VersionConflict) => {
                    if attempt >= max_attempts {
                        tracing::warn!(
                            %guild,
                            %user,
                            attempts = attempt,
                            "Optimistic concurrency retries exhausted"
                        );
                        return Err(EngineError::ConcurrencyExhausted { attempts: attempt });
                    }
                    tracing::debug!(%guild, %user, attempt, "Version conflict, retrying");
                }
                Err(err) => {
                    self.note_store_failure(&err, attempt, max_attempts).await?;
                }
            }
        }
    }

    /// Record a transient store failure and back off, or give up once
    /// the attempt budget is spent.
    async fn note_store_failure(
        &self,
        err: &StoreError,
        attempt: u32,
        max_attempts: u32,
    ) -> Result<(), EngineError> {
        if attempt >= max_attempts {
            tracing::warn!(%err, attempts = attempt, "Store retries exhausted");
            return Err(err.clone().into());
        }
        tracing::debug!(%err, attempt, "Store unavailable, backing off");
        let backoff = self
            .config
            .retry
            .backoff_ms
            .saturating_mul(u64::from(attempt));
        tokio::time::sleep(Duration::from_millis(backoff)).await;
        Ok(())
    }
}

/// Signed difference between two XP totals, saturating at the i64 range.
fn signed_delta(before: u64, after: u64) -> i64 {
    let before = i64::try_from(before).unwrap_or(i64::MAX);
    let after = i64::try_from(after).unwrap_or(i64::MAX);
    after.saturating_sub(before)
}
