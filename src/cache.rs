use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use serde::Serialize;

use crate::error::CacheError;
use crate::game::GameTypeKey;
use crate::stats::{CacheRow, HandStats};

pub type PlayerId = u64;
pub type RowId = u64;

/// One aggregation bucket: a game type, a player and the table's seat count.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CacheKey {
    pub game_type: GameTypeKey,
    pub player: PlayerId,
    pub seats: u8,
}

/// The upsert protocol a statistics store implements.
///
/// `upsert` inserts `row` as is when the key is new and adds it element-wise
/// to the stored row otherwise. Lookup and write happen as one unit, so
/// concurrent upserts of the same key never lose a hand.
pub trait CacheStore: Send + Sync {
    /// Stable id of a player name, assigned on first sight.
    fn player_id(&self, name: &str) -> Result<PlayerId, CacheError>;

    fn lookup(&self, key: &CacheKey) -> Result<Option<RowId>, CacheError>;

    fn upsert(&self, key: CacheKey, row: &CacheRow) -> Result<RowId, CacheError>;
}

#[derive(Debug, Default)]
struct Rows {
    index: HashMap<CacheKey, RowId>,
    rows: Vec<CacheRow>,
}

/// In-process [`CacheStore`]. Every row lives behind one lock.
#[derive(Debug, Default)]
pub struct MemoryCache {
    players: Mutex<HashMap<String, PlayerId>>,
    rows: Mutex<Rows>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, CacheError> {
    mutex.lock().map_err(|_| CacheError::Poisoned)
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, id: RowId) -> Result<Option<CacheRow>, CacheError> {
        Ok(lock(&self.rows)?.rows.get(id as usize).copied())
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(lock(&self.rows)?.rows.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Sum of a player's rows, optionally restricted to one seat count.
    pub fn totals(&self, player: PlayerId, seats: Option<u8>) -> Result<CacheRow, CacheError> {
        let rows = lock(&self.rows)?;
        let mut total = CacheRow::default();
        for (key, id) in &rows.index {
            if key.player != player || seats.map_or(false, |s| s != key.seats) {
                continue;
            }
            let row = rows.rows.get(*id as usize).ok_or(CacheError::MissingRow(*id))?;
            total.add(row);
        }
        Ok(total)
    }

    /// Player names with their ids, sorted by name.
    pub fn players(&self) -> Result<Vec<(String, PlayerId)>, CacheError> {
        let mut players: Vec<(String, PlayerId)> = lock(&self.players)?
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect();
        players.sort();
        Ok(players)
    }
}

impl CacheStore for MemoryCache {
    fn player_id(&self, name: &str) -> Result<PlayerId, CacheError> {
        let mut players = lock(&self.players)?;
        let next = players.len() as PlayerId;
        Ok(*players.entry(name.to_string()).or_insert(next))
    }

    fn lookup(&self, key: &CacheKey) -> Result<Option<RowId>, CacheError> {
        Ok(lock(&self.rows)?.index.get(key).copied())
    }

    fn upsert(&self, key: CacheKey, row: &CacheRow) -> Result<RowId, CacheError> {
        let mut guard = lock(&self.rows)?;
        let Rows { index, rows } = &mut *guard;

        match index.get(&key) {
            Some(&id) => {
                let stored = rows.get_mut(id as usize).ok_or(CacheError::MissingRow(id))?;
                stored.add(row);
                Ok(id)
            }
            None => {
                let id = rows.len() as RowId;
                debug!("upsert: new row {} for player {} ({})", id, key.player, key.game_type);
                rows.push(*row);
                index.insert(key, id);
                Ok(id)
            }
        }
    }
}

/// Upserts one row per seated player of a hand; returns how many were written.
pub fn store_hand(store: &dyn CacheStore, stats: &HandStats) -> Result<usize, CacheError> {
    let seats = u8::try_from(stats.seats()).unwrap_or(u8::MAX);
    for (name, player) in &stats.players {
        let key = CacheKey {
            game_type: stats.game.clone(),
            player: store.player_id(name)?,
            seats,
        };
        store.upsert(key, &CacheRow::seed(&player.flags))?;
    }
    info!("Stored hand {} for {} players", stats.hand_no, stats.players.len());
    Ok(stats.players.len())
}
