//! [`VaultClient`]: the context every vault operation runs against.
//!
//! A client owns the active app key, the transport, the local cache and the
//! request hooks. Operations take `&self` and may run concurrently; changing
//! the app id, service URL or hooks takes `&mut self`, so it cannot overlap
//! with an operation in flight.

use std::fmt;
use std::sync::Arc;

use common::protocol::{Op, VaultRequest, VaultResponse, VidField, PUBLISH_DURATION_DAYS};
use common::VaultError;
use tracing::{debug, info, warn};

use crate::cache::{CacheFront, KvStore, NullStore};
use crate::config::ClientConfig;
use crate::crypto::{self, AppKey, IndexWord, KeyBytes, SearchWord};
use crate::last_error::track;
use crate::result::{self, GetResult, VidMap};
use crate::telemetry::{register_secret, set_secret_placeholder};
use crate::transport::{
    HeaderHook, HeaderSet, HttpTransport, PostFieldHook, PostFields, Transport, TransportRequest,
};

/// Client context for one app id and one vault.
pub struct VaultClient {
    config: ClientConfig,
    app: Option<AppKey>,
    transport: Arc<dyn Transport>,
    cache: CacheFront,
    header_hook: Option<Arc<dyn HeaderHook>>,
    post_hook: Option<Arc<dyn PostFieldHook>>,
}

impl fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClient")
            .field("service_url", &self.config.service_url)
            .field("checksum", &self.app.as_ref().map(|a| a.checksum().as_str()))
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    /// Create a client.
    ///
    /// Without an `app_id` only the publishing operations work until
    /// [`set_app_id`](Self::set_app_id) is called. Without a `store` nothing
    /// is cached.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidParameter`] for an invalid configuration or app id,
    /// [`VaultError::ParameterMissing`] for an empty app id.
    pub fn new(
        config: ClientConfig,
        app_id: Option<&str>,
        transport: Arc<dyn Transport>,
        store: Option<Arc<dyn KvStore>>,
    ) -> Result<Self, VaultError> {
        track(Self::build(config, app_id, transport, store))
    }

    /// Create a client that talks HTTPS through [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus any [`HttpTransport::new`] failure.
    pub fn with_http(
        config: ClientConfig,
        app_id: Option<&str>,
        store: Option<Arc<dyn KvStore>>,
    ) -> Result<Self, VaultError> {
        let transport = track(HttpTransport::new(&config))?;
        Self::new(config, app_id, Arc::new(transport), store)
    }

    fn build(
        config: ClientConfig,
        app_id: Option<&str>,
        transport: Arc<dyn Transport>,
        store: Option<Arc<dyn KvStore>>,
    ) -> Result<Self, VaultError> {
        config
            .validate()
            .map_err(|e| VaultError::InvalidParameter(format!("{e:#}")))?;

        set_secret_placeholder(&config.secret_placeholder);
        if let Some(pass) = &config.proxy_pass {
            register_secret(pass);
        }

        let mut client = Self {
            config,
            app: None,
            transport,
            cache: CacheFront::new(store.unwrap_or_else(|| Arc::new(NullStore))),
            header_hook: None,
            post_hook: None,
        };
        client.apply_app_id(app_id)?;
        info!(
            service_url = %client.config.service_url,
            "vault client created"
        );
        Ok(client)
    }

    /// Replace the active app id. `None` clears it.
    ///
    /// # Errors
    ///
    /// As [`AppKey::derive`]. The previous app id stays active on error.
    pub fn set_app_id(&mut self, app_id: Option<&str>) -> Result<(), VaultError> {
        track(self.apply_app_id(app_id))
    }

    fn apply_app_id(&mut self, app_id: Option<&str>) -> Result<(), VaultError> {
        self.app = match app_id {
            Some(id) => {
                let key = AppKey::derive(id)?;
                register_secret(id);
                debug!(checksum = %key.checksum(), "app id set");
                Some(key)
            }
            None => None,
        };
        Ok(())
    }

    /// Replace the service URL.
    ///
    /// # Errors
    ///
    /// [`VaultError::ParameterMissing`] for an empty URL.
    pub fn set_service_url(&mut self, url: &str) -> Result<(), VaultError> {
        let url = url.trim().trim_end_matches('/');
        if url.is_empty() {
            return track(Err(VaultError::ParameterMissing("service url is empty".into())));
        }
        self.config.service_url = url.to_owned();
        track(Ok(()))
    }

    /// Install or clear the hook that adds request headers.
    pub fn set_header_hook(&mut self, hook: Option<Arc<dyn HeaderHook>>) {
        self.header_hook = hook;
    }

    /// Install or clear the hook that adds form fields.
    pub fn set_post_field_hook(&mut self, hook: Option<Arc<dyn PostFieldHook>>) {
        self.post_hook = hook;
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn app_key(&self) -> Result<&AppKey, VaultError> {
        self.app
            .as_ref()
            .ok_or_else(|| VaultError::ParameterMissing("no app id set".into()))
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Store `data` in the vault and return its new vid.
    ///
    /// # Errors
    ///
    /// Key, transport and vault errors. A failure to cache the data afterwards
    /// is only logged.
    pub async fn add(&self, data: &str, words: &[IndexWord]) -> Result<String, VaultError> {
        track(self.add_inner(data, words).await)
    }

    async fn add_inner(&self, data: &str, words: &[IndexWord]) -> Result<String, VaultError> {
        let app = self.app_key()?;
        let mut req = self.request(Op::Add);
        req.data = Some(crypto::encrypt(app.key(), app.checksum(), data)?);
        req.words = index_words(words);

        let resp = self.call(&req).await?;
        let vid = result::parse_vid(&resp)?;
        self.cache.remember(&vid, data);
        debug!(words = words.len(), "entry added");
        Ok(vid)
    }

    /// Replace the data of `vid`.
    ///
    /// # Errors
    ///
    /// [`VaultError::ParameterMissing`] for an empty vid, plus key, transport
    /// and vault errors.
    pub async fn update(&self, vid: &str, data: &str, words: &[IndexWord]) -> Result<(), VaultError> {
        let outcome = match self.app_key() {
            Ok(app) => self.update_with(app, vid, data, words).await,
            Err(e) => Err(e),
        };
        track(outcome)
    }

    /// Update `vid` encrypting with `app` rather than the active key.
    pub(crate) async fn update_with(
        &self,
        app: &AppKey,
        vid: &str,
        data: &str,
        words: &[IndexWord],
    ) -> Result<(), VaultError> {
        if vid.is_empty() {
            return Err(VaultError::ParameterMissing("vid is empty".into()));
        }
        let mut req = self.request(Op::Update);
        req.vid = Some(VidField::One(vid.to_owned()));
        req.data = Some(crypto::encrypt(app.key(), app.checksum(), data)?);
        req.words = index_words(words);

        self.call(&req).await?;
        self.cache.remember(vid, data);
        Ok(())
    }

    /// Fetch the data of `vids`, from the local cache where possible.
    ///
    /// Every requested vid has an entry in the returned map. At most one
    /// vault request is made, for the vids not in the cache.
    ///
    /// # Errors
    ///
    /// [`VaultError::ParameterMissing`] for an empty list, plus key, transport
    /// and vault errors. No partial results are returned on error.
    pub async fn get(&self, vids: &[String]) -> Result<VidMap, VaultError> {
        track(self.get_inner(vids).await)
    }

    async fn get_inner(&self, vids: &[String]) -> Result<VidMap, VaultError> {
        let app = self.app_key()?;
        ensure_vids(vids)?;

        let partition = self.cache.partition(vids);
        let mut out = VidMap::new();
        for (vid, data) in partition.hits {
            out.insert(vid, GetResult::success(data));
        }
        if partition.misses.is_empty() {
            return Ok(out);
        }

        let fetched = self
            .fetch(app.key(), Op::Get, &partition.misses, false)
            .await?;
        for (vid, res) in fetched {
            if let Some(data) = res.data.as_deref() {
                if res.status == result::GetStatus::Success {
                    self.cache.remember(&vid, data);
                }
            }
            out.insert(vid, res);
        }
        Ok(out)
    }

    /// Fetch `vids` from the vault, bypassing the cache.
    pub(crate) async fn fetch(
        &self,
        key: &KeyBytes,
        op: Op,
        vids: &[String],
        recode: bool,
    ) -> Result<VidMap, VaultError> {
        let mut req = self.request(op);
        req.vid = Some(VidField::Many(vids.to_vec()));
        let resp = self.call(&req).await?;
        result::classify_entries(key, &resp, vids, recode)
    }

    /// Vids of entries whose index words match every search word.
    ///
    /// # Errors
    ///
    /// [`VaultError::ParameterMissing`] without search words, plus transport
    /// and vault errors.
    pub async fn search(&self, words: &[SearchWord]) -> Result<Vec<String>, VaultError> {
        track(self.search_inner(words).await)
    }

    async fn search_inner(&self, words: &[SearchWord]) -> Result<Vec<String>, VaultError> {
        if words.is_empty() {
            return Err(VaultError::ParameterMissing("no search words".into()));
        }
        let mut req = self.request(Op::Search);
        req.words = Some(words.iter().map(|w| w.as_str().to_owned()).collect());
        let resp = self.call(&req).await?;
        result::parse_search(&resp)
    }

    /// Delete `vids` from the vault and the local cache.
    ///
    /// # Errors
    ///
    /// [`VaultError::ParameterMissing`] for an empty list, plus transport and
    /// vault errors.
    pub async fn delete(&self, vids: &[String]) -> Result<(), VaultError> {
        track(self.delete_inner(vids).await)
    }

    async fn delete_inner(&self, vids: &[String]) -> Result<(), VaultError> {
        ensure_vids(vids)?;
        let mut req = self.request(Op::Delete);
        req.vid = Some(VidField::Many(vids.to_vec()));
        self.call(&req).await?;
        if let Err(e) = self.cache.wipe(Some(vids)) {
            warn!(error = %e, "failed to drop deleted entries from local cache");
        }
        debug!(count = vids.len(), "entries deleted");
        Ok(())
    }

    /// Clear `vids`, or everything when `None`, from the local cache. The
    /// vault is not contacted. Returns the number of entries cleared.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub fn wipe(&self, vids: Option<&[String]>) -> Result<usize, VaultError> {
        track(self.cache.wipe(vids))
    }

    /// Publish `data` for `duration_days` under a password shared with the
    /// recipient. Published entries are never cached.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidParameter`] for a duration outside `1..=365`,
    /// [`VaultError::ParameterMissing`] for an empty password, plus transport
    /// and vault errors.
    pub async fn publish(
        &self,
        password: &str,
        duration_days: u32,
        data: &str,
    ) -> Result<String, VaultError> {
        track(self.publish_inner(password, duration_days, data).await)
    }

    async fn publish_inner(
        &self,
        password: &str,
        duration_days: u32,
        data: &str,
    ) -> Result<String, VaultError> {
        if !PUBLISH_DURATION_DAYS.contains(&duration_days) {
            return Err(VaultError::InvalidParameter(format!(
                "duration must be within {}..={} days, got {duration_days}",
                PUBLISH_DURATION_DAYS.start(),
                PUBLISH_DURATION_DAYS.end()
            )));
        }
        let pub_key = AppKey::for_password(password)?;
        register_secret(password);

        let mut req = self.request(Op::Publish);
        req.data = Some(crypto::encrypt(pub_key.key(), pub_key.checksum(), data)?);
        req.duration = Some(duration_days);
        let resp = self.call(&req).await?;
        result::parse_vid(&resp)
    }

    /// Fetch published entries. The cache is neither read nor written.
    ///
    /// # Errors
    ///
    /// [`VaultError::ParameterMissing`] for an empty password or vid list,
    /// plus transport and vault errors.
    pub async fn get_published(&self, password: &str, vids: &[String]) -> Result<VidMap, VaultError> {
        track(self.get_published_inner(password, vids).await)
    }

    async fn get_published_inner(&self, password: &str, vids: &[String]) -> Result<VidMap, VaultError> {
        let pub_key = AppKey::for_password(password)?;
        register_secret(password);
        ensure_vids(vids)?;
        let vids = dedup(vids);
        self.fetch(pub_key.key(), Op::GetPublished, &vids, false).await
    }

    // -----------------------------------------------------------------------
    // Wire
    // -----------------------------------------------------------------------

    fn request(&self, op: Op) -> VaultRequest {
        VaultRequest::new(self.config.protocol_version, op)
    }

    /// Post `req` and check the top-level status of the answer.
    async fn call(&self, req: &VaultRequest) -> Result<VaultResponse, VaultError> {
        let body = serde_json::to_string(req)
            .map_err(|e| VaultError::GeneralFailure(format!("failed to encode request: {e}")))?;

        let mut fields = PostFields::with_body(body);
        if let Some(hook) = &self.post_hook {
            hook.apply(&mut fields)?;
        }
        let mut headers = HeaderSet::default();
        if let Some(hook) = &self.header_hook {
            hook.apply(&mut headers)?;
        }

        let request = TransportRequest {
            url: self.config.service_url.clone(),
            fields: fields.into_vec(),
            headers: headers.into_vec(),
        };
        debug!(op = ?req.op, url = %request.url, "posting vault request");
        let body = self.transport.post(&request).await.map_err(|e| {
            warn!(op = ?req.op, error = %e, "vault request failed");
            VaultError::from(e)
        })?;
        result::check_status(&body)
    }
}

fn index_words(words: &[IndexWord]) -> Option<Vec<String>> {
    if words.is_empty() {
        None
    } else {
        Some(words.iter().map(|w| w.as_str().to_owned()).collect())
    }
}

fn ensure_vids(vids: &[String]) -> Result<(), VaultError> {
    if vids.is_empty() {
        return Err(VaultError::ParameterMissing("vid list is empty".into()));
    }
    if vids.iter().any(String::is_empty) {
        return Err(VaultError::InvalidParameter("vid list contains an empty vid".into()));
    }
    Ok(())
}

pub(crate) fn dedup(vids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(vids.len());
    for vid in vids {
        if !out.contains(vid) {
            out.push(vid.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, MockKvStore, StoreError};
    use crate::last_error::last_error;
    use crate::transport::{TransportError, TransportFuture};
    use std::sync::Mutex;

    const APP_ID: &str = "1Ha6xo2u{mRT18";

    /// Replays canned bodies and records every request.
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<Vec<Result<String, TransportError>>>,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl Scripted {
        fn reply(self, body: &str) -> Self {
            self.replies.lock().unwrap().push(Ok(body.to_owned()));
            self
        }

        fn fail(self, err: TransportError) -> Self {
            self.replies.lock().unwrap().push(Err(err));
            self
        }

        fn requests(&self) -> Vec<serde_json::Value> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| serde_json::from_str(r.json().unwrap()).unwrap())
                .collect()
        }
    }

    impl Transport for Scripted {
        fn post<'a>(&'a self, request: &'a TransportRequest) -> TransportFuture<'a> {
            self.seen.lock().unwrap().push(request.clone());
            let next = {
                let mut replies = self.replies.lock().unwrap();
                if replies.is_empty() {
                    Err(TransportError::Failed("no scripted reply".into()))
                } else {
                    replies.remove(0)
                }
            };
            Box::pin(async move { next })
        }
    }

    fn client(transport: Arc<Scripted>, store: Option<Arc<dyn KvStore>>) -> VaultClient {
        VaultClient::new(
            ClientConfig::new("https://vault.example/"),
            Some(APP_ID),
            transport,
            store,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn add_sends_recipe_and_words() {
        let t = Arc::new(Scripted::default().reply(r#"{"status":"OK","vid":"v1"}"#));
        let c = client(t.clone(), None);
        let word = IndexWord::new("Jane", APP_ID).unwrap();
        let vid = c.add("Jane Doe", std::slice::from_ref(&word)).await.unwrap();
        assert_eq!(vid, "v1");

        let req = &t.requests()[0];
        assert_eq!(req["version"], 2);
        assert_eq!(req["op"], "add");
        assert!(req["data"].as_str().unwrap().starts_with("aes-256-cbc:18:"));
        assert_eq!(req["words"][0], word.as_str());
        assert_eq!(t.seen.lock().unwrap()[0].url, "https://vault.example");
    }

    #[tokio::test]
    async fn add_without_words_omits_field() {
        let t = Arc::new(Scripted::default().reply(r#"{"status":"OK","vid":"v1"}"#));
        client(t.clone(), None).add("x", &[]).await.unwrap();
        assert!(t.requests()[0].get("words").is_none());
    }

    #[tokio::test]
    async fn rejected_request_sets_last_error() {
        let t = Arc::new(
            Scripted::default().reply(r#"{"status":"INVALID","code":2001,"desc":"bad sid"}"#),
        );
        let err = client(t, None).add("x", &[]).await.unwrap_err();
        assert_eq!(err.error_number(), Some(2001));
        assert!(last_error().unwrap().contains("bad sid"));
    }

    #[tokio::test]
    async fn update_sends_single_vid() {
        let t = Arc::new(Scripted::default().reply(r#"{"status":"OK"}"#));
        client(t.clone(), None).update("v9", "new", &[]).await.unwrap();
        let req = &t.requests()[0];
        assert_eq!(req["op"], "update");
        assert_eq!(req["vid"], "v9");
    }

    #[tokio::test]
    async fn get_decrypts_and_warms_cache() {
        let app = AppKey::derive(APP_ID).unwrap();
        let recipe = crypto::encrypt(app.key(), app.checksum(), "Jane").unwrap();
        let body = serde_json::json!({
            "status": "OK",
            "data": {"v1": {"status": "OK", "data": recipe}, "v2": {"status": "NOTFOUND"}}
        })
        .to_string();
        let t = Arc::new(Scripted::default().reply(&body));
        let store = Arc::new(MemoryStore::new());
        let c = client(t.clone(), Some(store.clone()));

        let vids = vec!["v1".to_string(), "v2".to_string()];
        let map = c.get(&vids).await.unwrap();
        assert_eq!(map.data("v1"), Some("Jane"));
        assert_eq!(map.status("v2"), Some(result::GetStatus::NotFound));
        assert_eq!(t.requests()[0]["vid"], serde_json::json!(["v1", "v2"]));
        assert_eq!(store.len(), 1);

        // served from cache, transport has no more replies
        let again = c.get(&vids[..1]).await.unwrap();
        assert_eq!(again.data("v1"), Some("Jane"));
        assert_eq!(t.requests().len(), 1);
    }

    #[tokio::test]
    async fn transport_errors_are_mapped() {
        let t = Arc::new(Scripted::default().fail(TransportError::NoInternet("dns".into())));
        let err = client(t, None).get(&["v1".to_string()]).await.unwrap_err();
        assert!(matches!(err, VaultError::NoInternet(_)));
    }

    #[tokio::test]
    async fn operations_need_an_app_id() {
        let t = Arc::new(Scripted::default());
        let c = VaultClient::new(ClientConfig::new("https://vault.example"), None, t.clone(), None)
            .unwrap();
        assert!(matches!(
            c.add("x", &[]).await,
            Err(VaultError::ParameterMissing(_))
        ));
        assert!(t.requests().is_empty());
    }

    #[tokio::test]
    async fn empty_vid_list_is_missing() {
        let t = Arc::new(Scripted::default());
        let c = client(t, None);
        assert!(matches!(c.get(&[]).await, Err(VaultError::ParameterMissing(_))));
        assert!(matches!(c.delete(&[]).await, Err(VaultError::ParameterMissing(_))));
        assert!(matches!(c.search(&[]).await, Err(VaultError::ParameterMissing(_))));
    }

    #[test]
    fn short_app_id_rejected_and_old_kept() {
        let t = Arc::new(Scripted::default());
        let mut c = client(t, None);
        assert!(matches!(
            c.set_app_id(Some("short")),
            Err(VaultError::InvalidParameter(_))
        ));
        assert_eq!(c.app_key().unwrap().checksum().as_str(), "18");
        c.set_app_id(None).unwrap();
        assert!(c.app_key().is_err());
    }

    #[test]
    fn app_id_is_redacted_from_last_error() {
        let t = Arc::new(Scripted::default());
        let mut c = client(t, None);
        assert!(c.set_service_url("").is_err());
        let _ = track::<()>(Err(VaultError::GeneralFailure(format!("oops {APP_ID}"))));
        assert!(!last_error().unwrap().contains(APP_ID));
    }

    #[tokio::test]
    async fn hooks_add_headers_and_fields() {
        let t = Arc::new(Scripted::default().reply(r#"{"status":"OK","vids":[]}"#));
        let mut c = client(t.clone(), None);
        c.set_header_hook(Some(Arc::new(|h: &mut HeaderSet| {
            h.set("Cache-Control", Some("max-age=60"))
        })));
        c.set_post_field_hook(Some(Arc::new(|f: &mut PostFields| f.set("sid", "42"))));

        let word = SearchWord::new("ja", APP_ID).unwrap();
        assert!(c.search(&[word]).await.unwrap().is_empty());

        let seen = t.seen.lock().unwrap()[0].clone();
        assert_eq!(seen.field("sid"), Some("42"));
        assert_eq!(
            seen.headers,
            vec![("Cache-Control".to_string(), "max-age=60".to_string())]
        );
    }

    #[tokio::test]
    async fn hook_error_aborts_request() {
        let t = Arc::new(Scripted::default().reply(r#"{"status":"OK","vid":"v1"}"#));
        let mut c = client(t.clone(), None);
        c.set_post_field_hook(Some(Arc::new(|f: &mut PostFields| f.set("json", "{}"))));
        assert!(matches!(
            c.add("x", &[]).await,
            Err(VaultError::InvalidParameter(_))
        ));
        assert!(t.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_drops_cached_entries() {
        let t = Arc::new(
            Scripted::default()
                .reply(r#"{"status":"OK","vid":"v1"}"#)
                .reply(r#"{"status":"OK"}"#),
        );
        let store = Arc::new(MemoryStore::new());
        let c = client(t.clone(), Some(store.clone()));
        let vid = c.add("Jane", &[]).await.unwrap();
        assert_eq!(store.len(), 1);
        c.delete(&[vid]).await.unwrap();
        assert_eq!(store.len(), 0);
        assert_eq!(t.requests()[1]["vid"], serde_json::json!(["v1"]));
    }

    #[tokio::test]
    async fn cache_write_failure_does_not_fail_add() {
        let mut store = MockKvStore::new();
        store
            .expect_set()
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("disk full".into())));
        let t = Arc::new(Scripted::default().reply(r#"{"status":"OK","vid":"v1"}"#));
        let c = client(t, Some(Arc::new(store)));
        assert_eq!(c.add("Jane", &[]).await.unwrap(), "v1");
    }

    #[tokio::test]
    async fn publish_validates_duration() {
        let t = Arc::new(Scripted::default());
        let c = client(t.clone(), None);
        for days in [0, 366] {
            assert!(matches!(
                c.publish("pw", days, "x").await,
                Err(VaultError::InvalidParameter(_))
            ));
        }
        assert!(t.requests().is_empty());
    }

    #[tokio::test]
    async fn publish_uses_password_key() {
        let t = Arc::new(Scripted::default().reply(r#"{"status":"OK","vid":"p1"}"#));
        let c = client(t.clone(), None);
        assert_eq!(c.publish("exchange-pw", 30, "shared").await.unwrap(), "p1");
        let req = &t.requests()[0];
        assert_eq!(req["op"], "publish");
        assert_eq!(req["duration"], 30);
        let recipe = req["data"].as_str().unwrap();
        assert!(recipe.starts_with("aes-256-cbc::"));
        let pw = AppKey::for_password("exchange-pw").unwrap();
        assert_eq!(crypto::decrypt(pw.key(), recipe).unwrap().plaintext, "shared");
    }

    #[test]
    fn dedup_keeps_order() {
        let v: Vec<String> = ["b", "a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dedup(&v), vec!["b".to_string(), "a".to_string()]);
    }
}
