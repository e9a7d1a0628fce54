//! In-memory vault speaking the JSON protocol, for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use common::protocol::{Op, VaultRequest, VidField};
use serde_json::{json, Map, Value};
use vault_client::{
    ClientConfig, KvStore, MemoryStore, Transport, TransportError, TransportFuture,
    TransportRequest, VaultClient,
};

pub const APP_ID: &str = "1Ha6xo2u{mRT18";
pub const NEW_APP_ID: &str = "Zq9!mK2pLw7vXe42";
pub const OTHER_APP_ID: &str = "unrelated-app-id-77";

#[derive(Debug, Clone)]
struct Entry {
    recipe: String,
    words: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    published: HashMap<String, String>,
    rejected_updates: HashSet<String>,
    ops: Vec<Op>,
}

/// Fake vault. Clones of the `Arc` share state.
#[derive(Debug, Default)]
pub struct FakeVault {
    state: Mutex<State>,
    offline: AtomicBool,
}

impl FakeVault {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following request fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of requests that reached the vault.
    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().ops.len()
    }

    /// Number of requests of kind `op`.
    pub fn op_count(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter(|o| **o == op)
            .count()
    }

    pub fn recipe(&self, vid: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .entries
            .get(vid)
            .map(|e| e.recipe.clone())
    }

    /// Overwrite the stored recipe of `vid`, creating the entry if needed.
    pub fn set_recipe(&self, vid: &str, recipe: &str) {
        self.state.lock().unwrap().entries.insert(
            vid.to_string(),
            Entry {
                recipe: recipe.to_string(),
                words: Vec::new(),
            },
        );
    }

    /// Answer every following update of `vid` with an error status.
    pub fn reject_updates_for(&self, vid: &str) {
        self.state
            .lock()
            .unwrap()
            .rejected_updates
            .insert(vid.to_string());
    }

    fn handle(&self, request: &TransportRequest) -> String {
        let Some(body) = request.json() else {
            return error("ERROR", 1, "missing json field");
        };
        let req: VaultRequest = match serde_json::from_str(body) {
            Ok(r) => r,
            Err(e) => return error("INVALID", 2, &e.to_string()),
        };

        let mut state = self.state.lock().unwrap();
        state.ops.push(req.op);

        match req.op {
            Op::Add => {
                let vid = uuid::Uuid::new_v4().to_string();
                let entry = Entry {
                    recipe: req.data.unwrap_or_default(),
                    words: req.words.unwrap_or_default(),
                };
                state.entries.insert(vid.clone(), entry);
                json!({"status": "OK", "vid": vid}).to_string()
            }
            Op::Update => {
                let Some(VidField::One(vid)) = req.vid else {
                    return error("INVALID", 3, "update needs one vid");
                };
                if state.rejected_updates.contains(&vid) {
                    return error("ERROR", 5, "update refused");
                }
                let Some(entry) = state.entries.get_mut(&vid) else {
                    return error("ERROR", 4, "unknown vid");
                };
                entry.recipe = req.data.unwrap_or_default();
                if let Some(words) = req.words {
                    entry.words = words;
                }
                json!({"status": "OK"}).to_string()
            }
            Op::Get | Op::GetPublished => {
                let Some(VidField::Many(vids)) = req.vid else {
                    return error("INVALID", 3, "get needs a vid list");
                };
                let mut data = Map::new();
                for vid in vids {
                    let recipe = if req.op == Op::Get {
                        state.entries.get(&vid).map(|e| e.recipe.clone())
                    } else {
                        state.published.get(&vid).cloned()
                    };
                    let entry = match recipe {
                        Some(r) => json!({"status": "OK", "data": r}),
                        None => json!({"status": "NOTFOUND"}),
                    };
                    data.insert(vid, entry);
                }
                json!({"status": "OK", "data": Value::Object(data)}).to_string()
            }
            Op::Publish => {
                let vid = uuid::Uuid::new_v4().to_string();
                state
                    .published
                    .insert(vid.clone(), req.data.unwrap_or_default());
                json!({"status": "OK", "vid": vid}).to_string()
            }
            Op::Search => {
                let words = req.words.unwrap_or_default();
                let mut vids: Vec<&String> = state
                    .entries
                    .iter()
                    .filter(|(_, e)| {
                        words
                            .iter()
                            .all(|w| e.words.iter().any(|stored| stored.starts_with(w.as_str())))
                    })
                    .map(|(vid, _)| vid)
                    .collect();
                vids.sort();
                json!({"status": "OK", "vids": vids}).to_string()
            }
            Op::Delete => {
                if let Some(VidField::Many(vids)) = req.vid {
                    for vid in vids {
                        state.entries.remove(&vid);
                    }
                }
                json!({"status": "OK"}).to_string()
            }
        }
    }
}

fn error(status: &str, code: i64, desc: &str) -> String {
    json!({"status": status, "code": code, "desc": desc}).to_string()
}

impl Transport for FakeVault {
    fn post<'a>(&'a self, request: &'a TransportRequest) -> TransportFuture<'a> {
        let result = if self.offline.load(Ordering::SeqCst) {
            Err(TransportError::NoInternet("fake vault is offline".into()))
        } else {
            Ok(self.handle(request))
        };
        Box::pin(async move { result })
    }
}

/// Client for `app_id` against `vault` with an optional cache.
pub fn client(
    vault: &Arc<FakeVault>,
    app_id: &str,
    store: Option<Arc<MemoryStore>>,
) -> VaultClient {
    let store = store.map(|s| s as Arc<dyn KvStore>);
    VaultClient::new(
        ClientConfig::new("https://vault.test"),
        Some(app_id),
        vault.clone(),
        store,
    )
    .unwrap()
}
