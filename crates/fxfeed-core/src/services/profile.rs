//! Trader profiles, stats and trade history under `users/{uid}`.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};

use super::{decode_children, newest_first, read, transact};
use crate::domain::{ProfileUpdate, TradeDraft, TradeRecord, TradingStats, UserProfile};
use crate::error::DomainError;
use crate::paths;
use crate::ports::RemoteStore;

pub struct ProfileService {
    store: Arc<dyn RemoteStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// The profile, or `None` when `users/{uid}` holds no profile fields
    /// (settings or history written before the first sign-in do not count).
    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        match self.store.get(&paths::user(uid)).await? {
            Some(value) if has_profile(&value) => Ok(Some(serde_json::from_value(value)?)),
            _ => Ok(None),
        }
    }

    /// Load the profile, creating it with first-sign-in defaults when the
    /// user has none yet.
    pub async fn ensure_profile(&self, uid: &str, email: &str) -> Result<UserProfile, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        let path = paths::user(uid);
        let fresh = serde_json::to_value(UserProfile::first_sign_in(email, Utc::now()))?;

        // Defaults fill only the children that are missing; history, audit
        // log and settings written before the first sign-in are kept.
        let created = self
            .store
            .transaction(&path, &|current| match current {
                Some(existing) if has_profile(existing) => None,
                Some(Value::Object(existing)) => {
                    let mut merged = existing.clone();
                    if let Value::Object(defaults) = &fresh {
                        for (key, value) in defaults {
                            merged.entry(key.clone()).or_insert_with(|| value.clone());
                        }
                    }
                    Some(Value::Object(merged))
                }
                _ => Some(fresh.clone()),
            })
            .await?;

        if let Some(created) = created {
            tracing::info!(user_id = %uid, "Profile created on first sign-in");
            return Ok(serde_json::from_value(created)?);
        }
        self.get_profile(uid)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile", uid))
    }

    /// Write only the supplied fields, so a concurrent edit of the other
    /// field is not reverted.
    pub async fn update_profile(
        &self,
        uid: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, DomainError> {
        update.validate()?;
        let uid = paths::check_key("userId", uid)?;
        if self.get_profile(uid).await?.is_none() {
            return Err(DomainError::not_found("Profile", uid));
        }

        self.store.update(&paths::user(uid), update.fields()).await?;
        tracing::info!(user_id = %uid, "Profile updated");

        self.get_profile(uid)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile", uid))
    }

    /// Stats, or zeroed stats for a user without any.
    pub async fn get_stats(&self, uid: &str) -> Result<TradingStats, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        Ok(read(self.store.as_ref(), &paths::stats(uid))
            .await?
            .unwrap_or_default())
    }

    pub async fn update_stats(&self, uid: &str, stats: TradingStats) -> Result<TradingStats, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        if stats.total_trades < stats.winning_trades {
            return Err(DomainError::invalid(
                "winningTrades",
                "cannot exceed totalTrades",
            ));
        }
        self.store
            .set(&paths::stats(uid), serde_json::to_value(&stats)?)
            .await?;
        Ok(stats)
    }

    /// Trade history, most recent first.
    pub async fn get_trades(&self, uid: &str) -> Result<Vec<TradeRecord>, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        let history = self.store.get(&paths::trading_history(uid)).await?;

        Ok(newest_first(decode_children::<TradeRecord>(history, "Trade"))
            .into_iter()
            .map(|(id, trade)| TradeRecord { id, ..trade })
            .collect())
    }

    /// Append a closed trade and fold it into the user's stats in the same
    /// transaction.
    pub async fn record_trade(
        &self,
        uid: &str,
        draft: TradeDraft,
    ) -> Result<(TradeRecord, TradingStats), DomainError> {
        draft.validate()?;
        let uid = paths::check_key("userId", uid)?;
        let key = self.store.generate_key();
        let trade = draft.into_record(String::new(), Utc::now());
        let trade_value = serde_json::to_value(&trade)?;

        let user = transact(self.store.as_ref(), &paths::user(uid), |current: Option<Value>| {
            let mut user = match current {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };

            let mut stats: TradingStats = match user.get("stats") {
                Some(v) => serde_json::from_value(v.clone())?,
                None => TradingStats::default(),
            };
            stats.record(trade.profit);
            user.insert("stats".into(), serde_json::to_value(&stats)?);

            let history = user
                .entry("tradingHistory")
                .or_insert_with(|| Value::Object(Map::new()));
            if !history.is_object() {
                *history = Value::Object(Map::new());
            }
            if let Value::Object(history) = history {
                history.insert(key.clone(), trade_value.clone());
            }
            Ok(Value::Object(user))
        })
        .await?;

        let stats: TradingStats = serde_json::from_value(user["stats"].clone())?;
        tracing::info!(
            user_id = %uid,
            trade_id = %key,
            profit = trade.profit,
            "Trade recorded"
        );
        Ok((TradeRecord { id: key, ..trade }, stats))
    }
}

fn has_profile(user: &Value) -> bool {
    user.get("name").is_some_and(Value::is_string)
}
