//! Re-keying stored entries from the active app id to a new one.
//!
//! Entries are fetched with the active key in recode mode, so an entry that
//! fails to decrypt still reports the checksum its recipe was made with:
//!
//! | fetched status        | recipe checksum | outcome                        |
//! |-----------------------|-----------------|--------------------------------|
//! | `Success`             | -               | re-encrypted and updated       |
//! | `InvalidCredentials`  | new app id's    | already migrated, `Success`    |
//! | `InvalidCredentials`  | any other       | left alone, checksum kept      |
//! | `NotFound`            | -               | left alone                     |
//! | `ProtocolError`       | -               | whole migration fails          |
//!
//! Running a migration again converges: migrated entries are recognised by
//! their checksum and no further writes are made.

use common::protocol::Op;
use common::VaultError;
use tracing::{debug, info, warn};

use crate::client::{dedup, VaultClient};
use crate::crypto::{AppKey, IndexWord};
use crate::last_error::track;
use crate::result::{GetStatus, VidMap};
use crate::telemetry::register_secret;

/// Supplies fresh index words for an entry being migrated.
pub trait IndexWords: Send + Sync {
    /// Index words for `plaintext`, stored under `vid`.
    fn index_words(&self, vid: &str, plaintext: &str) -> Result<Vec<IndexWord>, VaultError>;
}

impl<F> IndexWords for F
where
    F: Fn(&str, &str) -> Result<Vec<IndexWord>, VaultError> + Send + Sync,
{
    fn index_words(&self, vid: &str, plaintext: &str) -> Result<Vec<IndexWord>, VaultError> {
        self(vid, plaintext)
    }
}

/// Running tally for the summary log line.
#[derive(Debug, Default)]
struct Tally {
    migrated: usize,
    already: usize,
    foreign: usize,
    missing: usize,
}

impl VaultClient {
    /// Re-encrypt `vids` from the active app id to `new_app_id`.
    ///
    /// The returned map has an entry for every distinct vid. Entries that
    /// were migrated carry only their status, never plaintext. The client
    /// keeps its active app id; call [`set_app_id`](Self::set_app_id)
    /// afterwards to switch.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that is neither decryptable, already
    /// migrated, foreign nor missing, and on any transport or vault error.
    /// Entries updated before the failure stay migrated.
    pub async fn change_app_id(
        &self,
        new_app_id: &str,
        vids: &[String],
        index: Option<&dyn IndexWords>,
    ) -> Result<VidMap, VaultError> {
        track(self.change_app_id_inner(new_app_id, vids, index).await)
    }

    async fn change_app_id_inner(
        &self,
        new_app_id: &str,
        vids: &[String],
        index: Option<&dyn IndexWords>,
    ) -> Result<VidMap, VaultError> {
        let new_key = AppKey::derive(new_app_id)?;
        register_secret(new_app_id);
        let old_key = self.app_key()?;
        if vids.is_empty() {
            return Err(VaultError::ParameterMissing("vid list is empty".into()));
        }
        let vids = dedup(vids);

        info!(
            count = vids.len(),
            from = %old_key.checksum(),
            to = %new_key.checksum(),
            "migrating entries"
        );

        let mut map = self.fetch(old_key.key(), Op::Get, &vids, true).await?;
        let mut tally = Tally::default();

        for vid in &vids {
            let entry = map
                .get_mut(vid)
                .ok_or_else(|| VaultError::ProtocolError(format!("no entry for vid '{vid}'")))?;

            let plaintext = match entry.status {
                GetStatus::InvalidCredentials => {
                    if entry.data.as_deref() == Some(new_key.checksum().as_str()) {
                        debug!("entry already migrated");
                        entry.status = GetStatus::Success;
                        entry.data = None;
                        tally.already += 1;
                    } else {
                        warn!(checksum = ?entry.data, "entry was encrypted with an unrelated key");
                        tally.foreign += 1;
                    }
                    continue;
                }
                GetStatus::NotFound => {
                    debug!("entry no longer exists");
                    tally.missing += 1;
                    continue;
                }
                GetStatus::ProtocolError => {
                    return Err(entry.to_error(vid).unwrap_or_else(|| {
                        VaultError::ProtocolError(format!("no usable entry for vid '{vid}'"))
                    }));
                }
                GetStatus::Success => entry.data.take().ok_or_else(|| {
                    VaultError::ProtocolError(format!("entry for vid '{vid}' has no data"))
                })?,
            };

            let words = match index {
                Some(index) => index.index_words(vid, &plaintext)?,
                None => Vec::new(),
            };
            self.update_with(&new_key, vid, &plaintext, &words).await?;
            tally.migrated += 1;
        }

        info!(
            migrated = tally.migrated,
            already_migrated = tally.already,
            foreign = tally.foreign,
            not_found = tally.missing,
            "migration finished"
        );
        Ok(map)
    }
}
