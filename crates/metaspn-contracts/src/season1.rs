//! Season-1 chain account views and the payload dispatch registry.
//!
//! These records mirror on-chain account state observed by the indexer.
//! Chain-side producers emit camelCase field names (`seasonId`,
//! `authorityPubkey`, `towelMint`) and epoch-second timestamps
//! (`startTs`/`endTs`); per-type normalizers alias those onto the canonical
//! snake_case fields and canonical UTC strings before decoding, never
//! overwriting a canonical field that is already present.
//!
//! Dispatch by payload-type name goes through a process-wide registry built
//! once and never mutated. Parsing an unregistered name is an error;
//! validating one yields a failing verdict instead.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use metaspn_core::prelude::*;
use metaspn_core::timestamp;

/// Season-level account state: the reward pool and aggregate stakes.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonAccountView {
    pub season_id: i64,
    pub authority: String,
    pub towel_mint: String,
    pub active: bool,
    pub started_at: OffsetDateTime,
    pub schema_version: String,
    pub ended_at: Option<OffsetDateTime>,
    pub reward_pool_total: i64,
    pub reward_pool_remaining: i64,
    pub total_staked: i64,
    pub founder_locked_total: i64,
    pub metadata: BTreeMap<String, String>,
}

static SEASON_ACCOUNT_VIEW_SHAPE: RecordShape = RecordShape {
    name: "SeasonAccountView",
    fields: &[
        FieldSpec::required("season_id", Kind::Int),
        FieldSpec::required("authority", Kind::Str),
        FieldSpec::required("towel_mint", Kind::Str),
        FieldSpec::required("active", Kind::Bool),
        FieldSpec::required("started_at", Kind::Timestamp),
        FieldSpec::schema_version(),
        FieldSpec::optional("ended_at", Kind::Timestamp),
        FieldSpec::defaulted("reward_pool_total", Kind::Int, FieldDefault::Int(0)),
        FieldSpec::defaulted("reward_pool_remaining", Kind::Int, FieldDefault::Int(0)),
        FieldSpec::defaulted("total_staked", Kind::Int, FieldDefault::Int(0)),
        FieldSpec::defaulted("founder_locked_total", Kind::Int, FieldDefault::Int(0)),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl SchemaRecord for SeasonAccountView {
    const SHAPE: &'static RecordShape = &SEASON_ACCOUNT_VIEW_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.int("season_id", self.season_id);
        b.str("authority", &self.authority);
        b.str("towel_mint", &self.towel_mint);
        b.bool("active", self.active);
        b.timestamp("started_at", self.started_at);
        b.str("schema_version", &self.schema_version);
        b.opt_timestamp("ended_at", &self.ended_at);
        b.int("reward_pool_total", self.reward_pool_total);
        b.int("reward_pool_remaining", self.reward_pool_remaining);
        b.int("total_staked", self.total_staked);
        b.int("founder_locked_total", self.founder_locked_total);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            season_id: f.int("season_id")?,
            authority: f.str("authority")?,
            towel_mint: f.str("towel_mint")?,
            active: f.bool("active")?,
            started_at: f.timestamp("started_at")?,
            schema_version: f.str("schema_version")?,
            ended_at: f.opt_timestamp("ended_at")?,
            reward_pool_total: f.int("reward_pool_total")?,
            reward_pool_remaining: f.int("reward_pool_remaining")?,
            total_staked: f.int("total_staked")?,
            founder_locked_total: f.int("founder_locked_total")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

/// Per-game account state within a season.
#[derive(Debug, Clone, PartialEq)]
pub struct GameAccountView {
    pub season_id: i64,
    pub game_id: i64,
    pub attention_score_bps: i64,
    pub schema_version: String,
    pub metadata: BTreeMap<String, String>,
}

static GAME_ACCOUNT_VIEW_SHAPE: RecordShape = RecordShape {
    name: "GameAccountView",
    fields: &[
        FieldSpec::required("season_id", Kind::Int),
        FieldSpec::required("game_id", Kind::Int),
        FieldSpec::required("attention_score_bps", Kind::Int),
        FieldSpec::schema_version(),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl SchemaRecord for GameAccountView {
    const SHAPE: &'static RecordShape = &GAME_ACCOUNT_VIEW_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.int("season_id", self.season_id);
        b.int("game_id", self.game_id);
        b.int("attention_score_bps", self.attention_score_bps);
        b.str("schema_version", &self.schema_version);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            season_id: f.int("season_id")?,
            game_id: f.int("game_id")?,
            attention_score_bps: f.int("attention_score_bps")?,
            schema_version: f.str("schema_version")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

/// One player's stake on one game.
#[derive(Debug, Clone, PartialEq)]
pub struct StakeAccountView {
    pub owner: String,
    pub season_id: i64,
    pub game_id: i64,
    pub amount: i64,
    pub active: bool,
    pub schema_version: String,
    pub metadata: BTreeMap<String, String>,
}

static STAKE_ACCOUNT_VIEW_SHAPE: RecordShape = RecordShape {
    name: "StakeAccountView",
    fields: &[
        FieldSpec::required("owner", Kind::Str),
        FieldSpec::required("season_id", Kind::Int),
        FieldSpec::required("game_id", Kind::Int),
        FieldSpec::required("amount", Kind::Int),
        FieldSpec::required("active", Kind::Bool),
        FieldSpec::schema_version(),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl SchemaRecord for StakeAccountView {
    const SHAPE: &'static RecordShape = &STAKE_ACCOUNT_VIEW_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("owner", &self.owner);
        b.int("season_id", self.season_id);
        b.int("game_id", self.game_id);
        b.int("amount", self.amount);
        b.bool("active", self.active);
        b.str("schema_version", &self.schema_version);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            owner: f.str("owner")?,
            season_id: f.int("season_id")?,
            game_id: f.int("game_id")?,
            amount: f.int("amount")?,
            active: f.bool("active")?,
            schema_version: f.str("schema_version")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

/// One player's season-wide balances.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAccountView {
    pub owner: String,
    pub season_id: i64,
    pub issued_towel_balance: i64,
    pub staked_towel: i64,
    pub claimed_rewards: i64,
    pub has_claimed: bool,
    pub schema_version: String,
    pub metadata: BTreeMap<String, String>,
}

static PLAYER_ACCOUNT_VIEW_SHAPE: RecordShape = RecordShape {
    name: "PlayerAccountView",
    fields: &[
        FieldSpec::required("owner", Kind::Str),
        FieldSpec::required("season_id", Kind::Int),
        FieldSpec::required("issued_towel_balance", Kind::Int),
        FieldSpec::required("staked_towel", Kind::Int),
        FieldSpec::required("claimed_rewards", Kind::Int),
        FieldSpec::required("has_claimed", Kind::Bool),
        FieldSpec::schema_version(),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl SchemaRecord for PlayerAccountView {
    const SHAPE: &'static RecordShape = &PLAYER_ACCOUNT_VIEW_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("owner", &self.owner);
        b.int("season_id", self.season_id);
        b.int("issued_towel_balance", self.issued_towel_balance);
        b.int("staked_towel", self.staked_towel);
        b.int("claimed_rewards", self.claimed_rewards);
        b.bool("has_claimed", self.has_claimed);
        b.str("schema_version", &self.schema_version);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            owner: f.str("owner")?,
            season_id: f.int("season_id")?,
            issued_towel_balance: f.int("issued_towel_balance")?,
            staked_towel: f.int("staked_towel")?,
            claimed_rewards: f.int("claimed_rewards")?,
            has_claimed: f.bool("has_claimed")?,
            schema_version: f.str("schema_version")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

/// A founder's locked stake for a season.
#[derive(Debug, Clone, PartialEq)]
pub struct FounderStakeView {
    pub owner: String,
    pub season_id: i64,
    pub amount: i64,
    pub active: bool,
    pub schema_version: String,
    pub metadata: BTreeMap<String, String>,
}

static FOUNDER_STAKE_VIEW_SHAPE: RecordShape = RecordShape {
    name: "FounderStakeView",
    fields: &[
        FieldSpec::required("owner", Kind::Str),
        FieldSpec::required("season_id", Kind::Int),
        FieldSpec::required("amount", Kind::Int),
        FieldSpec::required("active", Kind::Bool),
        FieldSpec::schema_version(),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl SchemaRecord for FounderStakeView {
    const SHAPE: &'static RecordShape = &FOUNDER_STAKE_VIEW_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("owner", &self.owner);
        b.int("season_id", self.season_id);
        b.int("amount", self.amount);
        b.bool("active", self.active);
        b.str("schema_version", &self.schema_version);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            owner: f.str("owner")?,
            season_id: f.int("season_id")?,
            amount: f.int("amount")?,
            active: f.bool("active")?,
            schema_version: f.str("schema_version")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

/// An attention-score change for one game.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionScoreUpdate {
    pub season_id: i64,
    pub game_id: i64,
    pub attention_score_bps: i64,
    pub updated_at: OffsetDateTime,
    pub schema_version: String,
    pub updated_by: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

static ATTENTION_SCORE_UPDATE_SHAPE: RecordShape = RecordShape {
    name: "AttentionScoreUpdate",
    fields: &[
        FieldSpec::required("season_id", Kind::Int),
        FieldSpec::required("game_id", Kind::Int),
        FieldSpec::required("attention_score_bps", Kind::Int),
        FieldSpec::required("updated_at", Kind::Timestamp),
        FieldSpec::schema_version(),
        FieldSpec::optional("updated_by", Kind::Str),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl SchemaRecord for AttentionScoreUpdate {
    const SHAPE: &'static RecordShape = &ATTENTION_SCORE_UPDATE_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.int("season_id", self.season_id);
        b.int("game_id", self.game_id);
        b.int("attention_score_bps", self.attention_score_bps);
        b.timestamp("updated_at", self.updated_at);
        b.str("schema_version", &self.schema_version);
        b.opt_str("updated_by", &self.updated_by);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            season_id: f.int("season_id")?,
            game_id: f.int("game_id")?,
            attention_score_bps: f.int("attention_score_bps")?,
            updated_at: f.timestamp("updated_at")?,
            schema_version: f.str("schema_version")?,
            updated_by: f.opt_str("updated_by")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

/// A projected payout for one player, computed off-chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardProjection {
    pub projection_id: String,
    pub owner: String,
    pub season_id: i64,
    pub projected_at: OffsetDateTime,
    pub staked_towel: i64,
    pub total_staked: i64,
    pub reward_pool_total: i64,
    pub reward_pool_remaining: i64,
    pub projected_payout: i64,
    pub schema_version: String,
    pub metadata: BTreeMap<String, String>,
}

static REWARD_PROJECTION_SHAPE: RecordShape = RecordShape {
    name: "RewardProjection",
    fields: &[
        FieldSpec::required("projection_id", Kind::Str),
        FieldSpec::required("owner", Kind::Str),
        FieldSpec::required("season_id", Kind::Int),
        FieldSpec::required("projected_at", Kind::Timestamp),
        FieldSpec::required("staked_towel", Kind::Int),
        FieldSpec::required("total_staked", Kind::Int),
        FieldSpec::required("reward_pool_total", Kind::Int),
        FieldSpec::required("reward_pool_remaining", Kind::Int),
        FieldSpec::required("projected_payout", Kind::Int),
        FieldSpec::schema_version(),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl SchemaRecord for RewardProjection {
    const SHAPE: &'static RecordShape = &REWARD_PROJECTION_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("projection_id", &self.projection_id);
        b.str("owner", &self.owner);
        b.int("season_id", self.season_id);
        b.timestamp("projected_at", self.projected_at);
        b.int("staked_towel", self.staked_towel);
        b.int("total_staked", self.total_staked);
        b.int("reward_pool_total", self.reward_pool_total);
        b.int("reward_pool_remaining", self.reward_pool_remaining);
        b.int("projected_payout", self.projected_payout);
        b.str("schema_version", &self.schema_version);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            projection_id: f.str("projection_id")?,
            owner: f.str("owner")?,
            season_id: f.int("season_id")?,
            projected_at: f.timestamp("projected_at")?,
            staked_towel: f.int("staked_towel")?,
            total_staked: f.int("total_staked")?,
            reward_pool_total: f.int("reward_pool_total")?,
            reward_pool_remaining: f.int("reward_pool_remaining")?,
            projected_payout: f.int("projected_payout")?,
            schema_version: f.str("schema_version")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

/// A settled (or attempted) reward claim.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardClaim {
    pub claim_id: String,
    pub owner: String,
    pub season_id: i64,
    pub claimed_at: OffsetDateTime,
    pub amount: i64,
    pub status: String,
    pub schema_version: String,
    pub transaction_signature: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

static REWARD_CLAIM_SHAPE: RecordShape = RecordShape {
    name: "RewardClaim",
    fields: &[
        FieldSpec::required("claim_id", Kind::Str),
        FieldSpec::required("owner", Kind::Str),
        FieldSpec::required("season_id", Kind::Int),
        FieldSpec::required("claimed_at", Kind::Timestamp),
        FieldSpec::required("amount", Kind::Int),
        FieldSpec::required("status", Kind::Str),
        FieldSpec::schema_version(),
        FieldSpec::optional("transaction_signature", Kind::Str),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl SchemaRecord for RewardClaim {
    const SHAPE: &'static RecordShape = &REWARD_CLAIM_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("claim_id", &self.claim_id);
        b.str("owner", &self.owner);
        b.int("season_id", self.season_id);
        b.timestamp("claimed_at", self.claimed_at);
        b.int("amount", self.amount);
        b.str("status", &self.status);
        b.str("schema_version", &self.schema_version);
        b.opt_str("transaction_signature", &self.transaction_signature);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            claim_id: f.str("claim_id")?,
            owner: f.str("owner")?,
            season_id: f.int("season_id")?,
            claimed_at: f.timestamp("claimed_at")?,
            amount: f.int("amount")?,
            status: f.str("status")?,
            schema_version: f.str("schema_version")?,
            transaction_signature: f.opt_str("transaction_signature")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Payload normalization
// ---------------------------------------------------------------------------

fn normalized_object(tree: &Value, name: &str) -> SchemaResult<Map<String, Value>> {
    let mut obj = tree
        .as_object()
        .cloned()
        .ok_or_else(|| SchemaError::invalid_argument(format!("{name} payload must be a mapping")))?;
    if !obj.contains_key("schema_version") {
        obj.insert(
            "schema_version".to_string(),
            Value::String(DEFAULT_SCHEMA_VERSION.to_string()),
        );
    }
    Ok(obj)
}

/// Copy the first present alias onto `canonical`, unless `canonical` is
/// already set. A present-but-null alias is consumed without setting
/// anything.
fn alias(obj: &mut Map<String, Value>, canonical: &str, aliases: &[&str]) {
    if obj.contains_key(canonical) {
        return;
    }
    for name in aliases {
        if let Some(value) = obj.get(*name) {
            if !value.is_null() {
                let value = value.clone();
                obj.insert(canonical.to_string(), value);
            }
            return;
        }
    }
}

/// Like [`alias`], but the aliased value is epoch seconds and is converted
/// to the canonical UTC string form.
fn alias_epoch(
    obj: &mut Map<String, Value>,
    canonical: &str,
    aliases: &[&str],
) -> SchemaResult<()> {
    if obj.contains_key(canonical) {
        return Ok(());
    }
    for name in aliases {
        if let Some(value) = obj.get(*name) {
            if !value.is_null() {
                let rendered = timestamp::epoch_to_utc_string(epoch_seconds(value, name)?)?;
                obj.insert(canonical.to_string(), Value::String(rendered));
            }
            return Ok(());
        }
    }
    Ok(())
}

fn epoch_seconds(value: &Value, field: &str) -> SchemaResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| SchemaError::coercion(field, "epoch seconds", "number out of range")),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            SchemaError::coercion(field, "epoch seconds", format!("cannot parse '{s}'"))
        }),
        other => Err(SchemaError::coercion(
            field,
            "epoch seconds",
            format!("found {other}"),
        )),
    }
}

fn normalize_season_account_payload(tree: &Value) -> SchemaResult<Value> {
    let mut obj = normalized_object(tree, "SeasonAccountView")?;
    alias(&mut obj, "season_id", &["seasonId"]);
    alias(&mut obj, "authority", &["authority_pubkey", "authorityPubkey"]);
    alias(&mut obj, "towel_mint", &["towelMint"]);
    alias_epoch(&mut obj, "started_at", &["start_ts", "startTs"])?;
    alias_epoch(&mut obj, "ended_at", &["end_ts", "endTs"])?;
    alias(&mut obj, "reward_pool_total", &["rewardPoolTotal"]);
    alias(&mut obj, "reward_pool_remaining", &["rewardPoolRemaining"]);
    alias(&mut obj, "total_staked", &["totalStaked"]);
    alias(&mut obj, "founder_locked_total", &["founderLockedTotal"]);
    Ok(Value::Object(obj))
}

fn normalize_game_account_payload(tree: &Value) -> SchemaResult<Value> {
    let mut obj = normalized_object(tree, "GameAccountView")?;
    alias(&mut obj, "season_id", &["seasonId"]);
    alias(&mut obj, "game_id", &["gameId"]);
    alias(&mut obj, "attention_score_bps", &["attentionScoreBps"]);
    Ok(Value::Object(obj))
}

fn normalize_stake_account_payload(tree: &Value) -> SchemaResult<Value> {
    let mut obj = normalized_object(tree, "StakeAccountView")?;
    alias(&mut obj, "season_id", &["seasonId"]);
    alias(&mut obj, "game_id", &["gameId"]);
    Ok(Value::Object(obj))
}

fn normalize_player_account_payload(tree: &Value) -> SchemaResult<Value> {
    let mut obj = normalized_object(tree, "PlayerAccountView")?;
    alias(&mut obj, "season_id", &["seasonId"]);
    alias(&mut obj, "issued_towel_balance", &["issuedTowelBalance"]);
    alias(&mut obj, "staked_towel", &["stakedTowel"]);
    alias(&mut obj, "claimed_rewards", &["claimedRewards"]);
    alias(&mut obj, "has_claimed", &["hasClaimed"]);
    Ok(Value::Object(obj))
}

fn normalize_founder_stake_payload(tree: &Value) -> SchemaResult<Value> {
    let mut obj = normalized_object(tree, "FounderStakeView")?;
    alias(&mut obj, "season_id", &["seasonId"]);
    Ok(Value::Object(obj))
}

fn normalize_attention_score_payload(tree: &Value) -> SchemaResult<Value> {
    let mut obj = normalized_object(tree, "AttentionScoreUpdate")?;
    alias(&mut obj, "season_id", &["seasonId"]);
    alias(&mut obj, "game_id", &["gameId"]);
    alias(&mut obj, "attention_score_bps", &["attentionScoreBps"]);
    alias(&mut obj, "updated_at", &["updatedAt", "scored_at", "scoredAt"]);
    alias(&mut obj, "updated_by", &["updatedBy", "authority"]);
    Ok(Value::Object(obj))
}

fn normalize_reward_projection_payload(tree: &Value) -> SchemaResult<Value> {
    let mut obj = normalized_object(tree, "RewardProjection")?;
    alias(&mut obj, "projection_id", &["projectionId"]);
    alias(&mut obj, "season_id", &["seasonId"]);
    alias(&mut obj, "projected_at", &["projectedAt", "computed_at", "computedAt"]);
    alias(&mut obj, "staked_towel", &["stakedTowel", "staked_amount", "stakedAmount"]);
    alias(&mut obj, "total_staked", &["totalStaked"]);
    alias(&mut obj, "reward_pool_total", &["rewardPoolTotal"]);
    alias(&mut obj, "reward_pool_remaining", &["rewardPoolRemaining"]);
    alias(&mut obj, "projected_payout", &["projectedPayout"]);
    Ok(Value::Object(obj))
}

fn normalize_reward_claim_payload(tree: &Value) -> SchemaResult<Value> {
    let mut obj = normalized_object(tree, "RewardClaim")?;
    alias(&mut obj, "claim_id", &["claimId"]);
    alias(&mut obj, "season_id", &["seasonId"]);
    alias(&mut obj, "claimed_at", &["claimedAt"]);
    alias(&mut obj, "transaction_signature", &["transactionSignature", "tx", "tx_sig"]);
    Ok(Value::Object(obj))
}

// ---------------------------------------------------------------------------
// Typed parsers
// ---------------------------------------------------------------------------

pub fn parse_season_account_view(tree: &Value) -> SchemaResult<SeasonAccountView> {
    SeasonAccountView::from_tree(&normalize_season_account_payload(tree)?)
}

pub fn parse_game_account_view(tree: &Value) -> SchemaResult<GameAccountView> {
    GameAccountView::from_tree(&normalize_game_account_payload(tree)?)
}

pub fn parse_stake_account_view(tree: &Value) -> SchemaResult<StakeAccountView> {
    StakeAccountView::from_tree(&normalize_stake_account_payload(tree)?)
}

pub fn parse_player_account_view(tree: &Value) -> SchemaResult<PlayerAccountView> {
    PlayerAccountView::from_tree(&normalize_player_account_payload(tree)?)
}

pub fn parse_founder_stake_view(tree: &Value) -> SchemaResult<FounderStakeView> {
    FounderStakeView::from_tree(&normalize_founder_stake_payload(tree)?)
}

pub fn parse_attention_score_update(tree: &Value) -> SchemaResult<AttentionScoreUpdate> {
    AttentionScoreUpdate::from_tree(&normalize_attention_score_payload(tree)?)
}

pub fn parse_reward_projection(tree: &Value) -> SchemaResult<RewardProjection> {
    RewardProjection::from_tree(&normalize_reward_projection_payload(tree)?)
}

pub fn parse_reward_claim(tree: &Value) -> SchemaResult<RewardClaim> {
    RewardClaim::from_tree(&normalize_reward_claim_payload(tree)?)
}

// ---------------------------------------------------------------------------
// Typed validators
// ---------------------------------------------------------------------------

pub fn validate_season_account_view(view: &SeasonAccountView) -> Verdict {
    let mut reasons = Vec::new();
    if view.season_id <= 0 {
        reasons.push("season_id must be > 0".to_string());
    }
    if view.authority.is_empty() {
        reasons.push("authority must be non-empty".to_string());
    }
    if view.towel_mint.is_empty() {
        reasons.push("towel_mint must be non-empty".to_string());
    }
    if view.reward_pool_total < 0 {
        reasons.push("reward_pool_total must be >= 0".to_string());
    }
    if view.reward_pool_remaining < 0 {
        reasons.push("reward_pool_remaining must be >= 0".to_string());
    }
    if view.total_staked < 0 {
        reasons.push("total_staked must be >= 0".to_string());
    }
    if view.founder_locked_total < 0 {
        reasons.push("founder_locked_total must be >= 0".to_string());
    }
    // An empty key field trips the presence check as well as the
    // non-empty one; both reasons are reported.
    if view.authority.is_empty() {
        reasons.push("authority must be present".to_string());
    }
    if view.towel_mint.is_empty() {
        reasons.push("towel_mint must be present".to_string());
    }
    Verdict::from_reasons(reasons)
}

pub fn validate_game_account_view(view: &GameAccountView) -> Verdict {
    let mut reasons = Vec::new();
    if view.season_id <= 0 {
        reasons.push("season_id must be > 0".to_string());
    }
    if view.game_id <= 0 {
        reasons.push("game_id must be > 0".to_string());
    }
    if view.attention_score_bps < 0 || view.attention_score_bps > 10_000 {
        reasons.push("attention_score_bps must be between 0 and 10000".to_string());
    }
    Verdict::from_reasons(reasons)
}

pub fn validate_stake_account_view(view: &StakeAccountView) -> Verdict {
    let mut reasons = Vec::new();
    if view.owner.is_empty() {
        reasons.push("owner must be non-empty".to_string());
    }
    if view.season_id <= 0 {
        reasons.push("season_id must be > 0".to_string());
    }
    if view.game_id <= 0 {
        reasons.push("game_id must be > 0".to_string());
    }
    if view.amount < 0 {
        reasons.push("amount must be >= 0".to_string());
    }
    Verdict::from_reasons(reasons)
}

pub fn validate_player_account_view(view: &PlayerAccountView) -> Verdict {
    let mut reasons = Vec::new();
    if view.owner.is_empty() {
        reasons.push("owner must be non-empty".to_string());
    }
    if view.season_id <= 0 {
        reasons.push("season_id must be > 0".to_string());
    }
    if view.issued_towel_balance < 0 {
        reasons.push("issued_towel_balance must be >= 0".to_string());
    }
    if view.staked_towel < 0 {
        reasons.push("staked_towel must be >= 0".to_string());
    }
    if view.claimed_rewards < 0 {
        reasons.push("claimed_rewards must be >= 0".to_string());
    }
    Verdict::from_reasons(reasons)
}

pub fn validate_founder_stake_view(view: &FounderStakeView) -> Verdict {
    let mut reasons = Vec::new();
    if view.owner.is_empty() {
        reasons.push("owner must be non-empty".to_string());
    }
    if view.season_id <= 0 {
        reasons.push("season_id must be > 0".to_string());
    }
    if view.amount < 0 {
        reasons.push("amount must be >= 0".to_string());
    }
    Verdict::from_reasons(reasons)
}

pub fn validate_attention_score_update(update: &AttentionScoreUpdate) -> Verdict {
    let mut reasons = Vec::new();
    if update.season_id <= 0 {
        reasons.push("season_id must be > 0".to_string());
    }
    if update.game_id <= 0 {
        reasons.push("game_id must be > 0".to_string());
    }
    if update.attention_score_bps < 0 || update.attention_score_bps > 10_000 {
        reasons.push("attention_score_bps must be between 0 and 10000".to_string());
    }
    if matches!(update.updated_by.as_deref(), Some("")) {
        reasons.push("updated_by must be non-empty when provided".to_string());
    }
    Verdict::from_reasons(reasons)
}

pub fn validate_reward_projection(projection: &RewardProjection) -> Verdict {
    let mut reasons = Vec::new();
    if projection.projection_id.is_empty() {
        reasons.push("projection_id must be non-empty".to_string());
    }
    if projection.owner.is_empty() {
        reasons.push("owner must be non-empty".to_string());
    }
    if projection.season_id <= 0 {
        reasons.push("season_id must be > 0".to_string());
    }
    if projection.staked_towel < 0 {
        reasons.push("staked_towel must be >= 0".to_string());
    }
    if projection.total_staked < 0 {
        reasons.push("total_staked must be >= 0".to_string());
    }
    if projection.reward_pool_total < 0 {
        reasons.push("reward_pool_total must be >= 0".to_string());
    }
    if projection.reward_pool_remaining < 0 {
        reasons.push("reward_pool_remaining must be >= 0".to_string());
    }
    if projection.projected_payout < 0 {
        reasons.push("projected_payout must be >= 0".to_string());
    }
    if projection.reward_pool_remaining > projection.reward_pool_total {
        reasons.push("reward_pool_remaining must be <= reward_pool_total".to_string());
    }
    Verdict::from_reasons(reasons)
}

pub fn validate_reward_claim(claim: &RewardClaim) -> Verdict {
    let mut reasons = Vec::new();
    if claim.claim_id.is_empty() {
        reasons.push("claim_id must be non-empty".to_string());
    }
    if claim.owner.is_empty() {
        reasons.push("owner must be non-empty".to_string());
    }
    if claim.season_id <= 0 {
        reasons.push("season_id must be > 0".to_string());
    }
    if claim.amount < 0 {
        reasons.push("amount must be >= 0".to_string());
    }
    if !matches!(claim.status.as_str(), "claimed" | "rejected" | "pending") {
        reasons.push("status must be one of: claimed,rejected,pending".to_string());
    }
    Verdict::from_reasons(reasons)
}

// ---------------------------------------------------------------------------
// Dispatch registry
// ---------------------------------------------------------------------------

/// A parsed season-1 payload, tagged by record type.
#[derive(Debug, Clone, PartialEq)]
pub enum Season1Payload {
    SeasonAccount(SeasonAccountView),
    GameAccount(GameAccountView),
    StakeAccount(StakeAccountView),
    PlayerAccount(PlayerAccountView),
    FounderStake(FounderStakeView),
    AttentionScore(AttentionScoreUpdate),
    RewardProjection(RewardProjection),
    RewardClaim(RewardClaim),
}

impl Season1Payload {
    /// The registry name this payload dispatches under.
    pub fn payload_type(&self) -> &'static str {
        match self {
            Season1Payload::SeasonAccount(_) => "SeasonAccountView",
            Season1Payload::GameAccount(_) => "GameAccountView",
            Season1Payload::StakeAccount(_) => "StakeAccountView",
            Season1Payload::PlayerAccount(_) => "PlayerAccountView",
            Season1Payload::FounderStake(_) => "FounderStakeView",
            Season1Payload::AttentionScore(_) => "AttentionScoreUpdate",
            Season1Payload::RewardProjection(_) => "RewardProjection",
            Season1Payload::RewardClaim(_) => "RewardClaim",
        }
    }

    pub fn to_tree(&self, privacy_mode: bool) -> Value {
        match self {
            Season1Payload::SeasonAccount(v) => v.to_tree(privacy_mode),
            Season1Payload::GameAccount(v) => v.to_tree(privacy_mode),
            Season1Payload::StakeAccount(v) => v.to_tree(privacy_mode),
            Season1Payload::PlayerAccount(v) => v.to_tree(privacy_mode),
            Season1Payload::FounderStake(v) => v.to_tree(privacy_mode),
            Season1Payload::AttentionScore(v) => v.to_tree(privacy_mode),
            Season1Payload::RewardProjection(v) => v.to_tree(privacy_mode),
            Season1Payload::RewardClaim(v) => v.to_tree(privacy_mode),
        }
    }

    pub fn validate(&self) -> Verdict {
        match self {
            Season1Payload::SeasonAccount(v) => validate_season_account_view(v),
            Season1Payload::GameAccount(v) => validate_game_account_view(v),
            Season1Payload::StakeAccount(v) => validate_stake_account_view(v),
            Season1Payload::PlayerAccount(v) => validate_player_account_view(v),
            Season1Payload::FounderStake(v) => validate_founder_stake_view(v),
            Season1Payload::AttentionScore(v) => validate_attention_score_update(v),
            Season1Payload::RewardProjection(v) => validate_reward_projection(v),
            Season1Payload::RewardClaim(v) => validate_reward_claim(v),
        }
    }
}

struct PayloadSpec {
    parse: fn(&Value) -> SchemaResult<Season1Payload>,
    validate: fn(&Value) -> Verdict,
}

fn fold<T>(parsed: SchemaResult<T>, validate: fn(&T) -> Verdict) -> Verdict {
    match parsed {
        Ok(value) => validate(&value),
        Err(err) => Verdict::parse_error(err),
    }
}

static REGISTRY: Lazy<BTreeMap<&'static str, PayloadSpec>> = Lazy::new(|| {
    let mut registry: BTreeMap<&'static str, PayloadSpec> = BTreeMap::new();
    registry.insert(
        "SeasonAccountView",
        PayloadSpec {
            parse: |tree| parse_season_account_view(tree).map(Season1Payload::SeasonAccount),
            validate: |tree| fold(parse_season_account_view(tree), validate_season_account_view),
        },
    );
    registry.insert(
        "GameAccountView",
        PayloadSpec {
            parse: |tree| parse_game_account_view(tree).map(Season1Payload::GameAccount),
            validate: |tree| fold(parse_game_account_view(tree), validate_game_account_view),
        },
    );
    registry.insert(
        "StakeAccountView",
        PayloadSpec {
            parse: |tree| parse_stake_account_view(tree).map(Season1Payload::StakeAccount),
            validate: |tree| fold(parse_stake_account_view(tree), validate_stake_account_view),
        },
    );
    registry.insert(
        "PlayerAccountView",
        PayloadSpec {
            parse: |tree| parse_player_account_view(tree).map(Season1Payload::PlayerAccount),
            validate: |tree| fold(parse_player_account_view(tree), validate_player_account_view),
        },
    );
    registry.insert(
        "FounderStakeView",
        PayloadSpec {
            parse: |tree| parse_founder_stake_view(tree).map(Season1Payload::FounderStake),
            validate: |tree| fold(parse_founder_stake_view(tree), validate_founder_stake_view),
        },
    );
    registry.insert(
        "AttentionScoreUpdate",
        PayloadSpec {
            parse: |tree| parse_attention_score_update(tree).map(Season1Payload::AttentionScore),
            validate: |tree| {
                fold(parse_attention_score_update(tree), validate_attention_score_update)
            },
        },
    );
    registry.insert(
        "RewardProjection",
        PayloadSpec {
            parse: |tree| parse_reward_projection(tree).map(Season1Payload::RewardProjection),
            validate: |tree| fold(parse_reward_projection(tree), validate_reward_projection),
        },
    );
    registry.insert(
        "RewardClaim",
        PayloadSpec {
            parse: |tree| parse_reward_claim(tree).map(Season1Payload::RewardClaim),
            validate: |tree| fold(parse_reward_claim(tree), validate_reward_claim),
        },
    );
    registry
});

/// Parse a raw payload by registry name. Unregistered names are an error.
pub fn parse_season1_payload(payload_type: &str, tree: &Value) -> SchemaResult<Season1Payload> {
    match REGISTRY.get(payload_type) {
        Some(spec) => (spec.parse)(tree),
        None => Err(SchemaError::unknown_payload_type(payload_type)),
    }
}

/// Validate a raw payload by registry name. Unregistered names and decode
/// failures fold into a failing verdict; this function never errors.
pub fn validate_season1_payload(payload_type: &str, tree: &Value) -> Verdict {
    match REGISTRY.get(payload_type) {
        Some(spec) => (spec.validate)(tree),
        None => Verdict::unknown_payload_type(payload_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn chain_aliases_normalize_including_epochs() {
        let view = parse_season_account_view(&json!({
            "seasonId": 3,
            "authorityPubkey": "auth_1",
            "towelMint": "mint_1",
            "active": true,
            "startTs": 1_762_502_400i64
        }))
        .unwrap();
        assert_eq!(view.season_id, 3);
        assert_eq!(view.authority, "auth_1");
        assert_eq!(view.towel_mint, "mint_1");
        assert_eq!(
            view.to_tree(false)["started_at"],
            json!("2025-11-07T08:00:00Z")
        );
        assert_eq!(view.ended_at, None);
        assert_eq!(view.reward_pool_total, 0);
    }

    #[test]
    fn canonical_fields_win_over_aliases() {
        let view = parse_season_account_view(&json!({
            "season_id": 7,
            "seasonId": 3,
            "authority": "auth_real",
            "authorityPubkey": "auth_alias",
            "towel_mint": "mint_1",
            "active": true,
            "started_at": "2025-11-07T08:00:00Z"
        }))
        .unwrap();
        assert_eq!(view.season_id, 7);
        assert_eq!(view.authority, "auth_real");
    }

    #[test]
    fn unknown_payload_type_is_an_error_when_parsing() {
        let err = parse_season1_payload("NotAThing", &json!({})).unwrap_err();
        assert_matches!(err, SchemaError::UnknownPayloadType(name) if name == "NotAThing");
    }

    #[test]
    fn unknown_payload_type_is_a_verdict_when_validating() {
        let verdict = validate_season1_payload("NotAThing", &json!({}));
        assert!(!verdict.is_valid);
        assert_eq!(verdict.reasons, vec!["unknown_payload_type: NotAThing"]);
    }

    #[test]
    fn parse_failure_folds_to_parse_error() {
        let verdict = validate_season1_payload("RewardClaim", &json!({}));
        assert!(!verdict.is_valid);
        assert!(verdict.reasons[0].starts_with("parse_error:"));
    }

    #[test]
    fn reward_claim_accumulates_every_violation() {
        let verdict = validate_season1_payload(
            "RewardClaim",
            &json!({
                "claim_id": "",
                "owner": "",
                "season_id": 0,
                "claimed_at": "2026-02-06T12:00:00Z",
                "amount": -5,
                "status": "bogus"
            }),
        );
        assert!(!verdict.is_valid);
        assert_eq!(
            verdict.reasons,
            vec![
                "claim_id must be non-empty",
                "owner must be non-empty",
                "season_id must be > 0",
                "amount must be >= 0",
                "status must be one of: claimed,rejected,pending",
            ]
        );
    }

    #[test]
    fn attention_score_bounds_inclusive() {
        let base = json!({
            "seasonId": 1,
            "gameId": 2,
            "updatedAt": "2026-02-06T12:00:00Z"
        });

        let mut ok = base.clone();
        ok["attentionScoreBps"] = json!(10_000);
        assert!(validate_season1_payload("AttentionScoreUpdate", &ok).is_valid);

        let mut too_high = base;
        too_high["attentionScoreBps"] = json!(10_001);
        let verdict = validate_season1_payload("AttentionScoreUpdate", &too_high);
        assert_eq!(
            verdict.reasons,
            vec!["attention_score_bps must be between 0 and 10000"]
        );
    }

    #[test]
    fn attention_score_update_borrows_authority_for_updated_by() {
        let update = parse_attention_score_update(&json!({
            "seasonId": 1,
            "gameId": 2,
            "attentionScoreBps": 500,
            "scoredAt": "2026-02-06T12:00:00Z",
            "authority": "auth_1"
        }))
        .unwrap();
        assert_eq!(update.updated_by.as_deref(), Some("auth_1"));
    }

    #[test]
    fn reward_projection_pool_ordering_enforced() {
        let verdict = validate_season1_payload(
            "RewardProjection",
            &json!({
                "projectionId": "pr_1",
                "owner": "own_1",
                "seasonId": 1,
                "projectedAt": "2026-02-06T12:00:00Z",
                "stakedTowel": 10,
                "totalStaked": 100,
                "rewardPoolTotal": 50,
                "rewardPoolRemaining": 60,
                "projectedPayout": 5
            }),
        );
        assert_eq!(
            verdict.reasons,
            vec!["reward_pool_remaining must be <= reward_pool_total"]
        );
    }

    #[test]
    fn empty_authority_reports_both_reasons() {
        let verdict = validate_season1_payload(
            "SeasonAccountView",
            &json!({
                "seasonId": 1,
                "authority": "",
                "towelMint": "mint_1",
                "active": true,
                "started_at": "2025-11-07T08:00:00Z"
            }),
        );
        assert_eq!(
            verdict.reasons,
            vec!["authority must be non-empty", "authority must be present"]
        );
    }

    #[test]
    fn round_trip_after_normalization() {
        let claim = parse_reward_claim(&json!({
            "claimId": "c_1",
            "owner": "own_1",
            "seasonId": 2,
            "claimedAt": "2026-02-06T12:00:00Z",
            "amount": 100,
            "status": "claimed",
            "tx": "sig_1"
        }))
        .unwrap();
        assert_eq!(claim.transaction_signature.as_deref(), Some("sig_1"));
        assert_eq!(RewardClaim::from_tree(&claim.to_tree(false)).unwrap(), claim);
    }
}
