//! The `PostgreSQL`-backed progression store.
//!
//! Implements [`ProgressionStore`] over one `user_progression` table.
//! Compare-and-swap is a conditional `UPDATE ... WHERE version = $n`;
//! a zero row count means another writer won and the engine retries.
//! Creation uses `ON CONFLICT DO NOTHING` so concurrent first events
//! for the same user cannot double-insert.

use sqlx::PgPool;

use joystreak_core::store::{CasResult, CreateResult, ProgressionStore, StoreError};
use joystreak_types::{CharacterClass, EpochDay, GuildId, UserId, UserProgression};

use crate::error::DbError;
use crate::postgres::PostgresPool;

const SELECT_COLUMNS: &str = "guild_id, user_id, xp, level, streak, \
     last_qualifying_day, last_action_day, last_claim_day, class, hp, coins, version";

/// Sort keys for the guild leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardSort {
    /// Cumulative XP (the default board).
    Xp,
    /// Current level.
    Level,
    /// Active streak length.
    Streak,
    /// Coin balance.
    Coins,
}

impl LeaderboardSort {
    /// Column backing the sort. Static names only, never built from
    /// input.
    const fn column(self) -> &'static str {
        match self {
            Self::Xp => "xp",
            Self::Level => "level",
            Self::Streak => "streak",
            Self::Coins => "coins",
        }
    }
}

/// Progression store backed by a `PostgreSQL` pool.
///
/// Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct PgProgressionStore {
    pool: PgPool,
}

impl PgProgressionStore {
    /// Bind a store to a connection pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    /// Query the top `limit` users in a guild by the given sort key,
    /// descending.
    ///
    /// Backs leaderboard rendering by the platform collaborator; not
    /// part of the engine's store contract.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::CorruptRow`] if a stored class name does not parse.
    pub async fn top_users(
        &self,
        guild: GuildId,
        sort: LeaderboardSort,
        limit: i64,
    ) -> Result<Vec<UserProgression>, DbError> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM user_progression \
             WHERE guild_id = $1 ORDER BY {column} DESC, user_id ASC LIMIT $2",
            column = sort.column()
        );
        let rows = sqlx::query_as::<_, ProgressionRow>(&query)
            .bind(id_to_db(guild.into_inner()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| record_from_row(row).map(|(record, _version)| record))
            .collect()
    }

    async fn fetch_row(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<ProgressionRow>, DbError> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM user_progression \
             WHERE guild_id = $1 AND user_id = $2"
        );
        let row = sqlx::query_as::<_, ProgressionRow>(&query)
            .bind(id_to_db(guild.into_inner()))
            .bind(id_to_db(user.into_inner()))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

impl ProgressionStore for PgProgressionStore {
    async fn get(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<(UserProgression, u64)>, StoreError> {
        let row = self
            .fetch_row(guild, user)
            .await
            .map_err(into_store_error)?;
        row.map(|row| record_from_row(row).map_err(into_store_error))
            .transpose()
    }

    async fn create(&self, record: &UserProgression) -> Result<CreateResult, StoreError> {
        let result = sqlx::query(
            r"INSERT INTO user_progression
              (guild_id, user_id, xp, level, streak,
               last_qualifying_day, last_action_day, last_claim_day,
               class, hp, coins)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
              ON CONFLICT (guild_id, user_id) DO NOTHING",
        )
        .bind(id_to_db(record.guild_id.into_inner()))
        .bind(id_to_db(record.user_id.into_inner()))
        .bind(quantity_to_db(record.xp))
        .bind(small_to_db(record.level))
        .bind(small_to_db(record.streak))
        .bind(record.last_qualifying_day.map(EpochDay::into_inner))
        .bind(record.last_action_day.map(EpochDay::into_inner))
        .bind(record.last_claim_day.map(EpochDay::into_inner))
        .bind(record.class.map(CharacterClass::as_str))
        .bind(small_to_db(record.hp))
        .bind(quantity_to_db(record.coins))
        .execute(&self.pool)
        .await
        .map_err(|e| into_store_error(DbError::Postgres(e)))?;

        if result.rows_affected() == 0 {
            Ok(CreateResult::AlreadyExists)
        } else {
            tracing::debug!(
                guild = %record.guild_id,
                user = %record.user_id,
                "Inserted progression row"
            );
            Ok(CreateResult::Created)
        }
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: &UserProgression,
    ) -> Result<CasResult, StoreError> {
        let result = sqlx::query(
            r"UPDATE user_progression SET
                xp = $3, level = $4, streak = $5,
                last_qualifying_day = $6, last_action_day = $7,
                last_claim_day = $8, class = $9, hp = $10, coins = $11,
                version = version + 1, updated_at = now()
              WHERE guild_id = $1 AND user_id = $2 AND version = $12",
        )
        .bind(id_to_db(record.guild_id.into_inner()))
        .bind(id_to_db(record.user_id.into_inner()))
        .bind(quantity_to_db(record.xp))
        .bind(small_to_db(record.level))
        .bind(small_to_db(record.streak))
        .bind(record.last_qualifying_day.map(EpochDay::into_inner))
        .bind(record.last_action_day.map(EpochDay::into_inner))
        .bind(record.last_claim_day.map(EpochDay::into_inner))
        .bind(record.class.map(CharacterClass::as_str))
        .bind(small_to_db(record.hp))
        .bind(quantity_to_db(record.coins))
        .bind(quantity_to_db(expected_version))
        .execute(&self.pool)
        .await
        .map_err(|e| into_store_error(DbError::Postgres(e)))?;

        if result.rows_affected() == 0 {
            Ok(CasResult::VersionConflict)
        } else {
            Ok(CasResult::Applied)
        }
    }

    async fn list_users(&self, guild: GuildId) -> Result<Vec<UserId>, StoreError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT user_id FROM user_progression WHERE guild_id = $1 ORDER BY user_id",
        )
        .bind(id_to_db(guild.into_inner()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| into_store_error(DbError::Postgres(e)))?;

        Ok(rows
            .into_iter()
            .map(|(user_id,)| UserId::new(id_from_db(user_id)))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// One `user_progression` row as stored. Field types mirror the
/// column types exactly: `BIGINT` decodes as `i64`, `INTEGER` as
/// `i32` -- the checked row decoding rejects any mismatch.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProgressionRow {
    guild_id: i64,
    user_id: i64,
    xp: i64,
    level: i32,
    streak: i32,
    last_qualifying_day: Option<i64>,
    last_action_day: Option<i64>,
    last_claim_day: Option<i64>,
    class: Option<String>,
    hp: i32,
    coins: i64,
    version: i64,
}

/// Platform IDs are unsigned but stored as `BIGINT`; current snowflake
/// ranges fit, and out-of-range values clamp rather than wrap.
fn id_to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn id_from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn quantity_to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// `level`, `streak`, and `hp` live in `INTEGER` columns.
fn small_to_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn record_from_row(row: ProgressionRow) -> Result<(UserProgression, u64), DbError> {
    let class = row
        .class
        .as_deref()
        .map(|name| {
            CharacterClass::parse(name).ok_or_else(|| DbError::CorruptRow {
                guild_id: row.guild_id,
                user_id: row.user_id,
                reason: format!("unknown class '{name}'"),
            })
        })
        .transpose()?;

    let mut record = UserProgression::new(
        GuildId::new(id_from_db(row.guild_id)),
        UserId::new(id_from_db(row.user_id)),
    );
    record.xp = u64::try_from(row.xp).unwrap_or(0);
    record.level = u32::try_from(row.level).unwrap_or(0);
    record.streak = u32::try_from(row.streak).unwrap_or(0);
    record.last_qualifying_day = row.last_qualifying_day.map(EpochDay::new);
    record.last_action_day = row.last_action_day.map(EpochDay::new);
    record.last_claim_day = row.last_claim_day.map(EpochDay::new);
    record.class = class;
    record.hp = u32::try_from(row.hp).unwrap_or(0);
    record.coins = u64::try_from(row.coins).unwrap_or(0);

    let version = u64::try_from(row.version).unwrap_or(0);
    Ok((record, version))
}

fn into_store_error(err: DbError) -> StoreError {
    StoreError::Unavailable {
        reason: err.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row() -> ProgressionRow {
        ProgressionRow {
            guild_id: 42,
            user_id: 7,
            xp: 150,
            level: 3,
            streak: 5,
            last_qualifying_day: Some(19_800),
            last_action_day: Some(19_800),
            last_claim_day: None,
            class: Some("pit_wizard".to_owned()),
            hp: 70,
            coins: 12,
            version: 9,
        }
    }

    #[test]
    fn row_maps_to_record_and_version() {
        let (record, version) = record_from_row(row()).unwrap();
        assert_eq!(record.guild_id, GuildId::new(42));
        assert_eq!(record.user_id, UserId::new(7));
        assert_eq!(record.xp, 150);
        assert_eq!(record.level, 3);
        assert_eq!(record.streak, 5);
        assert_eq!(record.last_qualifying_day, Some(EpochDay::new(19_800)));
        assert_eq!(record.last_claim_day, None);
        assert_eq!(record.class, Some(CharacterClass::PitWizard));
        assert_eq!(record.hp, 70);
        assert_eq!(record.coins, 12);
        assert_eq!(version, 9);
    }

    #[test]
    fn unknown_class_is_a_corrupt_row() {
        let mut bad = row();
        bad.class = Some("bard".to_owned());
        let err = record_from_row(bad).unwrap_err();
        assert!(matches!(err, DbError::CorruptRow { .. }));
    }

    #[test]
    fn classless_row_maps_to_none() {
        let mut bare = row();
        bare.class = None;
        let (record, _) = record_from_row(bare).unwrap();
        assert_eq!(record.class, None);
    }

    #[test]
    fn ids_clamp_rather_than_wrap() {
        assert_eq!(id_to_db(u64::MAX), i64::MAX);
        assert_eq!(id_from_db(-1), 0);
        assert_eq!(id_to_db(123), 123);
        assert_eq!(id_from_db(123), 123);
    }

    #[test]
    fn integer_columns_clamp_rather_than_wrap() {
        assert_eq!(small_to_db(u32::MAX), i32::MAX);
        assert_eq!(small_to_db(70), 70);
    }

    #[test]
    fn row_field_types_match_their_columns() {
        use sqlx::{Postgres, Type};

        // The checked row decoding requires the Rust field type to
        // match the column type exactly: INTEGER columns (level,
        // streak, hp) must decode as i32, BIGINT columns as i64.
        let int4 = <i32 as Type<Postgres>>::type_info();
        let int8 = <i64 as Type<Postgres>>::type_info();
        assert!(<i32 as Type<Postgres>>::compatible(&int4));
        assert!(<i64 as Type<Postgres>>::compatible(&int8));
        assert!(!<i64 as Type<Postgres>>::compatible(&int4));
        assert!(!<i32 as Type<Postgres>>::compatible(&int8));
    }

    #[test]
    fn leaderboard_sorts_map_to_fixed_columns() {
        assert_eq!(LeaderboardSort::Xp.column(), "xp");
        assert_eq!(LeaderboardSort::Level.column(), "level");
        assert_eq!(LeaderboardSort::Streak.column(), "streak");
        assert_eq!(LeaderboardSort::Coins.column(), "coins");
    }
}
