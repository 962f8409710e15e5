//! Request messages and their version-aware wire shapes.
//!
//! One sum type covers every client request. Shapes differ per
//! negotiated version (INIT vs HELLO, bare vs sized PULL, ROUTE's
//! string-db vs extra-map third field), so structure building takes the
//! version and fails with `InvalidMessageForVersion` or
//! `InvalidExtraParameter` instead of writing anything illegal.

use std::collections::HashMap;
use std::time::Duration;

use super::signature;
use super::vocabulary::{is_legal, MessageKind};
use crate::bolt::error::BoltError;
use crate::bolt::handshake::BoltVersion;
use crate::bolt::packstream::{Structure, Value};

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    #[default]
    Write,
    Read,
}

impl AccessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
        }
    }
}

/// Authentication token carried by INIT, HELLO (pre-5.1) or LOGON.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub scheme: String,
    pub principal: Option<String>,
    pub credentials: Option<String>,
    pub realm: Option<String>,
    pub parameters: HashMap<String, Value>,
}

impl AuthToken {
    pub fn basic(principal: impl Into<String>, credentials: impl Into<String>) -> Self {
        Self {
            scheme: "basic".to_owned(),
            principal: Some(principal.into()),
            credentials: Some(credentials.into()),
            realm: None,
            parameters: HashMap::new(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            scheme: "bearer".to_owned(),
            principal: None,
            credentials: Some(token.into()),
            realm: None,
            parameters: HashMap::new(),
        }
    }

    pub fn none() -> Self {
        Self {
            scheme: "none".to_owned(),
            principal: None,
            credentials: None,
            realm: None,
            parameters: HashMap::new(),
        }
    }

    pub fn to_map(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("scheme".to_owned(), Value::from(self.scheme.as_str()));
        if let Some(ref p) = self.principal {
            map.insert("principal".to_owned(), Value::from(p.as_str()));
        }
        if let Some(ref c) = self.credentials {
            map.insert("credentials".to_owned(), Value::from(c.as_str()));
        }
        if let Some(ref r) = self.realm {
            map.insert("realm".to_owned(), Value::from(r.as_str()));
        }
        for (k, v) in &self.parameters {
            map.insert(k.clone(), v.clone());
        }
        map
    }
}

/// Notification delivery preferences (Bolt 5.2+ / 5.6+).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationConfig {
    pub minimum_severity: Option<String>,
    pub disabled_classifications: Option<Vec<String>>,
}

impl NotificationConfig {
    fn is_empty(&self) -> bool {
        self.minimum_severity.is_none() && self.disabled_classifications.is_none()
    }

    fn apply(
        &self,
        version: BoltVersion,
        extra: &mut HashMap<String, Value>,
    ) -> Result<(), BoltError> {
        if let Some(ref severity) = self.minimum_severity {
            if !version.supports_notification_filtering() {
                return Err(BoltError::InvalidExtraParameter(format!(
                    "notifications_minimum_severity requires Bolt >= 5.2, negotiated {version}"
                )));
            }
            extra.insert(
                "notifications_minimum_severity".to_owned(),
                Value::from(severity.as_str()),
            );
        }
        if let Some(ref classifications) = self.disabled_classifications {
            if !version.supports_notification_classifications() {
                return Err(BoltError::InvalidExtraParameter(format!(
                    "notifications_disabled_classifications requires Bolt >= 5.6, negotiated {version}"
                )));
            }
            extra.insert(
                "notifications_disabled_classifications".to_owned(),
                Value::List(
                    classifications
                        .iter()
                        .map(|c| Value::from(c.as_str()))
                        .collect(),
                ),
            );
        }
        Ok(())
    }
}

/// HELLO / INIT payload.
///
/// On 5.1+ the encoder never writes inline auth; credentials travel in
/// a separate LOGON.
#[derive(Debug, Clone)]
pub struct HelloMessage {
    pub user_agent: String,
    pub auth: Option<AuthToken>,
    pub routing: Option<HashMap<String, Value>>,
    pub notifications: NotificationConfig,
}

impl HelloMessage {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            auth: None,
            routing: None,
            notifications: NotificationConfig::default(),
        }
    }

    pub fn with_auth(mut self, auth: AuthToken) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_routing(mut self, routing: HashMap<String, Value>) -> Self {
        self.routing = Some(routing);
        self
    }

    fn bolt_agent() -> Value {
        let mut agent = HashMap::new();
        agent.insert(
            "product".to_owned(),
            Value::from(concat!("boltline/", env!("CARGO_PKG_VERSION"))),
        );
        agent.insert(
            "platform".to_owned(),
            Value::String(format!(
                "{}; {}",
                std::env::consts::OS,
                std::env::consts::ARCH
            )),
        );
        agent.insert("language".to_owned(), Value::from("rust"));
        Value::Map(agent)
    }

    fn to_structure(&self, version: BoltVersion) -> Result<Structure, BoltError> {
        if version.uses_init() {
            // INIT: client name and auth map as two separate fields.
            let auth = self.auth.as_ref().map(AuthToken::to_map).unwrap_or_default();
            return Ok(Structure::new(
                signature::HELLO,
                vec![Value::from(self.user_agent.as_str()), Value::Map(auth)],
            ));
        }

        let mut extra = HashMap::new();
        extra.insert("user_agent".to_owned(), Value::from(self.user_agent.as_str()));
        if !version.supports_logon() {
            if let Some(ref auth) = self.auth {
                for (k, v) in auth.to_map() {
                    extra.insert(k, v);
                }
            }
        }
        if let Some(ref routing) = self.routing {
            if !version.supports_routing_context() {
                return Err(BoltError::InvalidExtraParameter(format!(
                    "routing context requires Bolt >= 4.1, negotiated {version}"
                )));
            }
            extra.insert("routing".to_owned(), Value::Map(routing.clone()));
        }
        if version.supports_bolt_agent() {
            extra.insert("bolt_agent".to_owned(), Self::bolt_agent());
        }
        self.notifications.apply(version, &mut extra)?;
        Ok(Structure::new(signature::HELLO, vec![Value::Map(extra)]))
    }
}

/// Extras for PULL and DISCARD (Bolt 4+).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamExtras {
    /// How many records to fetch: `-1` for all, otherwise positive.
    pub n: i64,
    /// Statement handle; `-1` addresses the last statement.
    pub qid: Option<i64>,
}

impl StreamExtras {
    pub fn all() -> Self {
        Self { n: -1, qid: None }
    }

    pub fn count(n: i64) -> Self {
        Self { n, qid: None }
    }

    pub fn with_qid(mut self, qid: i64) -> Self {
        self.qid = Some(qid);
        self
    }

    fn validate(&self) -> Result<(), BoltError> {
        if self.n != -1 && self.n <= 0 {
            return Err(BoltError::InvalidExtraParameter(format!(
                "n must be -1 or positive, got {}",
                self.n
            )));
        }
        if let Some(qid) = self.qid {
            if qid < -1 {
                return Err(BoltError::InvalidExtraParameter(format!(
                    "qid must be -1 or non-negative, got {qid}"
                )));
            }
        }
        Ok(())
    }

    fn to_map(self) -> HashMap<String, Value> {
        let mut extra = HashMap::new();
        extra.insert("n".to_owned(), Value::Integer(self.n));
        if let Some(qid) = self.qid {
            extra.insert("qid".to_owned(), Value::Integer(qid));
        }
        extra
    }
}

/// Metadata shared by RUN (auto-commit) and BEGIN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxExtras {
    pub bookmarks: Vec<String>,
    pub tx_timeout: Option<Duration>,
    pub mode: AccessMode,
    pub db: Option<String>,
    pub imp_user: Option<String>,
    pub tx_metadata: HashMap<String, Value>,
}

impl TxExtras {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = Some(timeout);
        self
    }

    pub fn with_imp_user(mut self, user: impl Into<String>) -> Self {
        self.imp_user = Some(user.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
            && self.tx_timeout.is_none()
            && self.mode == AccessMode::Write
            && self.db.is_none()
            && self.imp_user.is_none()
            && self.tx_metadata.is_empty()
    }

    fn to_map(&self, version: BoltVersion) -> Result<HashMap<String, Value>, BoltError> {
        let mut extra = HashMap::new();
        if !self.bookmarks.is_empty() {
            extra.insert(
                "bookmarks".to_owned(),
                Value::List(self.bookmarks.iter().map(|b| Value::from(b.as_str())).collect()),
            );
        }
        if let Some(timeout) = self.tx_timeout {
            extra.insert(
                "tx_timeout".to_owned(),
                Value::Integer(timeout.as_millis() as i64),
            );
        }
        if self.mode == AccessMode::Read {
            extra.insert("mode".to_owned(), Value::from("r"));
        }
        if let Some(ref db) = self.db {
            if !version.supports_db_selection() {
                return Err(BoltError::InvalidExtraParameter(format!(
                    "database selection requires Bolt >= 4.0, negotiated {version}"
                )));
            }
            extra.insert("db".to_owned(), Value::from(db.as_str()));
        }
        if let Some(ref imp) = self.imp_user {
            if !version.supports_imp_user() {
                return Err(BoltError::InvalidExtraParameter(format!(
                    "imp_user requires Bolt >= 4.3, negotiated {version}"
                )));
            }
            extra.insert("imp_user".to_owned(), Value::from(imp.as_str()));
        }
        if !self.tx_metadata.is_empty() {
            extra.insert("tx_metadata".to_owned(), Value::Map(self.tx_metadata.clone()));
        }
        Ok(extra)
    }
}

/// RUN payload: opaque statement text plus parameters and metadata.
#[derive(Debug, Clone)]
pub struct RunMessage {
    pub query: String,
    pub parameters: HashMap<String, Value>,
    pub extras: TxExtras,
}

impl RunMessage {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: HashMap::new(),
            extras: TxExtras::default(),
        }
    }

    pub fn with_parameters(mut self, parameters: HashMap<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_extras(mut self, extras: TxExtras) -> Self {
        self.extras = extras;
        self
    }

    fn to_structure(&self, version: BoltVersion) -> Result<Structure, BoltError> {
        let mut fields = vec![
            Value::from(self.query.as_str()),
            Value::Map(self.parameters.clone()),
        ];
        if version.supports_transactions() {
            fields.push(Value::Map(self.extras.to_map(version)?));
        } else if !self.extras.is_empty() {
            return Err(BoltError::InvalidExtraParameter(format!(
                "RUN metadata requires Bolt >= 3, negotiated {version}"
            )));
        }
        Ok(Structure::new(signature::RUN, fields))
    }
}

/// ROUTE payload (Bolt 4.3+).
#[derive(Debug, Clone, Default)]
pub struct RouteMessage {
    pub routing: HashMap<String, Value>,
    pub bookmarks: Vec<String>,
    pub db: Option<String>,
    pub imp_user: Option<String>,
}

impl RouteMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    fn to_structure(&self, version: BoltVersion) -> Result<Structure, BoltError> {
        let bookmarks = Value::List(
            self.bookmarks
                .iter()
                .map(|b| Value::from(b.as_str()))
                .collect(),
        );
        let third = if version.route_uses_extra_map() {
            let mut extra = HashMap::new();
            if let Some(ref db) = self.db {
                extra.insert("db".to_owned(), Value::from(db.as_str()));
            }
            if let Some(ref imp) = self.imp_user {
                extra.insert("imp_user".to_owned(), Value::from(imp.as_str()));
            }
            Value::Map(extra)
        } else {
            if self.imp_user.is_some() {
                return Err(BoltError::InvalidExtraParameter(format!(
                    "ROUTE imp_user requires Bolt >= 4.4, negotiated {version}"
                )));
            }
            match self.db {
                Some(ref db) => Value::from(db.as_str()),
                None => Value::Null,
            }
        };
        Ok(Structure::new(
            signature::ROUTE,
            vec![Value::Map(self.routing.clone()), bookmarks, third],
        ))
    }
}

/// Every request the client can send.
#[derive(Debug, Clone)]
pub enum BoltRequest {
    /// HELLO on v3+, INIT on v1/v2 (same signature byte).
    Hello(HelloMessage),
    Logon(AuthToken),
    Logoff,
    /// TELEMETRY api point (Bolt 5.4+).
    Telemetry(i64),
    Goodbye,
    AckFailure,
    Reset,
    Run(RunMessage),
    Discard(StreamExtras),
    DiscardAll,
    Pull(StreamExtras),
    PullAll,
    Begin(TxExtras),
    Commit,
    Rollback,
    Route(RouteMessage),
}

impl BoltRequest {
    /// The vocabulary kind this request resolves to under `version`.
    pub fn kind(&self, version: BoltVersion) -> MessageKind {
        match self {
            BoltRequest::Hello(_) => {
                if version.uses_init() {
                    MessageKind::Init
                } else {
                    MessageKind::Hello
                }
            }
            BoltRequest::Logon(_) => MessageKind::Logon,
            BoltRequest::Logoff => MessageKind::Logoff,
            BoltRequest::Telemetry(_) => MessageKind::Telemetry,
            BoltRequest::Goodbye => MessageKind::Goodbye,
            BoltRequest::AckFailure => MessageKind::AckFailure,
            BoltRequest::Reset => MessageKind::Reset,
            BoltRequest::Run(_) => MessageKind::Run,
            BoltRequest::Discard(_) => MessageKind::Discard,
            BoltRequest::DiscardAll => MessageKind::DiscardAll,
            BoltRequest::Pull(_) => MessageKind::Pull,
            BoltRequest::PullAll => MessageKind::PullAll,
            BoltRequest::Begin(_) => MessageKind::Begin,
            BoltRequest::Commit => MessageKind::Commit,
            BoltRequest::Rollback => MessageKind::Rollback,
            BoltRequest::Route(_) => MessageKind::Route,
        }
    }

    /// Map equivalent request forms onto the version's vocabulary:
    /// bare streaming becomes `{n: -1}` on v4+ and back, ACK_FAILURE
    /// becomes RESET on v4+.
    pub fn normalize(self, version: BoltVersion) -> BoltRequest {
        match self {
            BoltRequest::PullAll if version.uses_pull_n() => {
                BoltRequest::Pull(StreamExtras::all())
            }
            BoltRequest::DiscardAll if version.uses_pull_n() => {
                BoltRequest::Discard(StreamExtras::all())
            }
            BoltRequest::Pull(extras)
                if !version.uses_pull_n() && extras == StreamExtras::all() =>
            {
                BoltRequest::PullAll
            }
            BoltRequest::Discard(extras)
                if !version.uses_pull_n() && extras == StreamExtras::all() =>
            {
                BoltRequest::DiscardAll
            }
            BoltRequest::AckFailure if !version.supports_ack_failure() => BoltRequest::Reset,
            other => other,
        }
    }

    /// Normalize, check legality, validate extras and build the wire
    /// structure. No bytes are produced for an illegal combination.
    pub fn to_structure(&self, version: BoltVersion) -> Result<Structure, BoltError> {
        let req = self.clone().normalize(version);
        let kind = req.kind(version);
        if !is_legal(version, kind) {
            return Err(BoltError::InvalidMessageForVersion {
                kind: kind.name(),
                version: version.to_string(),
            });
        }
        match req {
            BoltRequest::Hello(msg) => msg.to_structure(version),
            BoltRequest::Logon(auth) => Ok(Structure::new(
                signature::LOGON,
                vec![Value::Map(auth.to_map())],
            )),
            BoltRequest::Logoff => Ok(Structure::new(signature::LOGOFF, vec![])),
            BoltRequest::Telemetry(api) => {
                if api < 0 {
                    return Err(BoltError::InvalidExtraParameter(format!(
                        "telemetry api must be non-negative, got {api}"
                    )));
                }
                Ok(Structure::new(
                    signature::TELEMETRY,
                    vec![Value::Integer(api)],
                ))
            }
            BoltRequest::Goodbye => Ok(Structure::new(signature::GOODBYE, vec![])),
            BoltRequest::AckFailure => Ok(Structure::new(signature::ACK_FAILURE, vec![])),
            BoltRequest::Reset => Ok(Structure::new(signature::RESET, vec![])),
            BoltRequest::Run(msg) => msg.to_structure(version),
            BoltRequest::Discard(extras) => {
                extras.validate()?;
                Ok(Structure::new(
                    signature::DISCARD,
                    vec![Value::Map(extras.to_map())],
                ))
            }
            BoltRequest::DiscardAll => Ok(Structure::new(signature::DISCARD, vec![])),
            BoltRequest::Pull(extras) => {
                extras.validate()?;
                Ok(Structure::new(
                    signature::PULL,
                    vec![Value::Map(extras.to_map())],
                ))
            }
            BoltRequest::PullAll => Ok(Structure::new(signature::PULL, vec![])),
            BoltRequest::Begin(extras) => Ok(Structure::new(
                signature::BEGIN,
                vec![Value::Map(extras.to_map(version)?)],
            )),
            BoltRequest::Commit => Ok(Structure::new(signature::COMMIT, vec![])),
            BoltRequest::Rollback => Ok(Structure::new(signature::ROLLBACK, vec![])),
            BoltRequest::Route(msg) => msg.to_structure(version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(s: &Structure, field: usize) -> &HashMap<String, Value> {
        s.fields[field].as_map().expect("map field")
    }

    #[test]
    fn init_shape_on_v1() {
        let hello = HelloMessage::new("boltline-test/0").with_auth(AuthToken::basic("u", "p"));
        let s = BoltRequest::Hello(hello).to_structure(BoltVersion::V1).unwrap();
        assert_eq!(s.signature, signature::HELLO);
        assert_eq!(s.fields.len(), 2);
        assert_eq!(s.fields[0].as_str(), Some("boltline-test/0"));
        assert_eq!(map_of(&s, 1).get("scheme").unwrap().as_str(), Some("basic"));
    }

    #[test]
    fn hello_inlines_auth_through_v5_0() {
        let hello = HelloMessage::new("agent").with_auth(AuthToken::basic("u", "p"));
        let s = BoltRequest::Hello(hello).to_structure(BoltVersion::V5_0).unwrap();
        assert_eq!(s.fields.len(), 1);
        let extra = map_of(&s, 0);
        assert_eq!(extra.get("principal").unwrap().as_str(), Some("u"));
        assert!(extra.contains_key("bolt_agent"));
    }

    #[test]
    fn hello_omits_auth_from_v5_1() {
        let hello = HelloMessage::new("agent").with_auth(AuthToken::basic("u", "p"));
        let s = BoltRequest::Hello(hello).to_structure(BoltVersion::V5_1).unwrap();
        let extra = map_of(&s, 0);
        assert!(!extra.contains_key("scheme"));
        assert!(!extra.contains_key("principal"));
        assert!(!extra.contains_key("credentials"));
    }

    #[test]
    fn hello_bolt_agent_only_from_v5() {
        let s = BoltRequest::Hello(HelloMessage::new("agent"))
            .to_structure(BoltVersion::V4_4)
            .unwrap();
        assert!(!map_of(&s, 0).contains_key("bolt_agent"));

        let s = BoltRequest::Hello(HelloMessage::new("agent"))
            .to_structure(BoltVersion::V5_0)
            .unwrap();
        let agent = map_of(&s, 0).get("bolt_agent").unwrap().as_map().unwrap();
        assert!(agent.get("product").unwrap().as_str().unwrap().starts_with("boltline/"));
        assert_eq!(agent.get("language").unwrap().as_str(), Some("rust"));
        assert!(agent.contains_key("platform"));
    }

    #[test]
    fn hello_notification_gates() {
        let mut hello = HelloMessage::new("agent");
        hello.notifications.minimum_severity = Some("WARNING".into());
        let err = BoltRequest::Hello(hello.clone())
            .to_structure(BoltVersion::V5_1)
            .unwrap_err();
        assert!(matches!(err, BoltError::InvalidExtraParameter(_)));

        let s = BoltRequest::Hello(hello.clone()).to_structure(BoltVersion::V5_2).unwrap();
        assert_eq!(
            map_of(&s, 0).get("notifications_minimum_severity").unwrap().as_str(),
            Some("WARNING")
        );

        hello.notifications.disabled_classifications = Some(vec!["HINT".into()]);
        assert!(BoltRequest::Hello(hello.clone())
            .to_structure(BoltVersion::V5_4)
            .is_err());
        let s = BoltRequest::Hello(hello).to_structure(BoltVersion::V5_6).unwrap();
        assert!(map_of(&s, 0).contains_key("notifications_disabled_classifications"));
    }

    #[test]
    fn routing_context_needs_v4_1() {
        let mut ctx = HashMap::new();
        ctx.insert("address".to_owned(), Value::from("example.com:7687"));
        let hello = HelloMessage::new("agent").with_routing(ctx);
        assert!(BoltRequest::Hello(hello.clone())
            .to_structure(BoltVersion::V4_0)
            .is_err());
        let s = BoltRequest::Hello(hello).to_structure(BoltVersion::V4_1).unwrap();
        assert!(map_of(&s, 0).contains_key("routing"));
    }

    #[test]
    fn run_has_two_fields_before_v3() {
        let run = RunMessage::new("RETURN 1");
        let s = BoltRequest::Run(run).to_structure(BoltVersion::V2).unwrap();
        assert_eq!(s.fields.len(), 2);
    }

    #[test]
    fn run_metadata_rejected_before_v3() {
        let run = RunMessage::new("RETURN 1").with_extras(TxExtras::new().with_bookmarks(vec![
            "bm:1".into(),
        ]));
        assert!(matches!(
            BoltRequest::Run(run).to_structure(BoltVersion::V2),
            Err(BoltError::InvalidExtraParameter(_))
        ));
    }

    #[test]
    fn run_extra_map_from_v3() {
        let run = RunMessage::new("RETURN 1")
            .with_extras(TxExtras::new().with_mode(AccessMode::Read));
        let s = BoltRequest::Run(run).to_structure(BoltVersion::V3).unwrap();
        assert_eq!(s.fields.len(), 3);
        assert_eq!(map_of(&s, 2).get("mode").unwrap().as_str(), Some("r"));
    }

    #[test]
    fn db_selection_needs_v4() {
        let begin = TxExtras::new().with_db("neo4j");
        assert!(matches!(
            BoltRequest::Begin(begin.clone()).to_structure(BoltVersion::V3),
            Err(BoltError::InvalidExtraParameter(_))
        ));
        let s = BoltRequest::Begin(begin).to_structure(BoltVersion::V4_0).unwrap();
        assert_eq!(map_of(&s, 0).get("db").unwrap().as_str(), Some("neo4j"));
    }

    #[test]
    fn imp_user_needs_v4_3() {
        let begin = TxExtras::new().with_imp_user("alice");
        assert!(BoltRequest::Begin(begin.clone())
            .to_structure(BoltVersion::V4_2)
            .is_err());
        let s = BoltRequest::Begin(begin).to_structure(BoltVersion::V4_3).unwrap();
        assert_eq!(map_of(&s, 0).get("imp_user").unwrap().as_str(), Some("alice"));
    }

    #[test]
    fn begin_timeout_in_milliseconds() {
        let begin = TxExtras::new().with_timeout(Duration::from_secs(2));
        let s = BoltRequest::Begin(begin).to_structure(BoltVersion::V4_4).unwrap();
        assert_eq!(map_of(&s, 0).get("tx_timeout").unwrap().as_int(), Some(2000));
    }

    #[test]
    fn pull_all_normalizes_to_sized_pull_on_v4() {
        let s = BoltRequest::PullAll.to_structure(BoltVersion::V4_0).unwrap();
        assert_eq!(s.signature, signature::PULL);
        assert_eq!(map_of(&s, 0).get("n").unwrap().as_int(), Some(-1));
    }

    #[test]
    fn pull_all_is_bare_before_v4() {
        let s = BoltRequest::PullAll.to_structure(BoltVersion::V3).unwrap();
        assert_eq!(s.signature, signature::PULL);
        assert!(s.fields.is_empty());

        // The sized form with n = -1 collapses to the bare form too.
        let s = BoltRequest::Pull(StreamExtras::all())
            .to_structure(BoltVersion::V1)
            .unwrap();
        assert!(s.fields.is_empty());
    }

    #[test]
    fn sized_pull_rejected_before_v4() {
        assert!(matches!(
            BoltRequest::Pull(StreamExtras::count(10)).to_structure(BoltVersion::V3),
            Err(BoltError::InvalidMessageForVersion { kind: "PULL", .. })
        ));
    }

    #[test]
    fn pull_extras_are_validated() {
        assert!(matches!(
            BoltRequest::Pull(StreamExtras::count(0)).to_structure(BoltVersion::V4_4),
            Err(BoltError::InvalidExtraParameter(_))
        ));
        assert!(matches!(
            BoltRequest::Pull(StreamExtras::count(-2)).to_structure(BoltVersion::V4_4),
            Err(BoltError::InvalidExtraParameter(_))
        ));
        assert!(matches!(
            BoltRequest::Pull(StreamExtras::count(5).with_qid(-2)).to_structure(BoltVersion::V4_4),
            Err(BoltError::InvalidExtraParameter(_))
        ));

        let s = BoltRequest::Pull(StreamExtras::count(5).with_qid(-1))
            .to_structure(BoltVersion::V4_4)
            .unwrap();
        assert_eq!(map_of(&s, 0).get("qid").unwrap().as_int(), Some(-1));
    }

    #[test]
    fn discard_mirrors_pull() {
        let s = BoltRequest::DiscardAll.to_structure(BoltVersion::V4_4).unwrap();
        assert_eq!(s.signature, signature::DISCARD);
        assert_eq!(map_of(&s, 0).get("n").unwrap().as_int(), Some(-1));

        let s = BoltRequest::DiscardAll.to_structure(BoltVersion::V2).unwrap();
        assert!(s.fields.is_empty());
    }

    #[test]
    fn ack_failure_becomes_reset_on_v4() {
        let s = BoltRequest::AckFailure.to_structure(BoltVersion::V4_0).unwrap();
        assert_eq!(s.signature, signature::RESET);

        let s = BoltRequest::AckFailure.to_structure(BoltVersion::V3).unwrap();
        assert_eq!(s.signature, signature::ACK_FAILURE);
    }

    #[test]
    fn route_third_field_by_version() {
        let route = RouteMessage::new().with_db("neo4j");
        let s = BoltRequest::Route(route.clone())
            .to_structure(BoltVersion::V4_3)
            .unwrap();
        assert_eq!(s.fields[2].as_str(), Some("neo4j"));

        let s = BoltRequest::Route(route).to_structure(BoltVersion::V4_4).unwrap();
        assert_eq!(
            s.fields[2].as_map().unwrap().get("db").unwrap().as_str(),
            Some("neo4j")
        );
    }

    #[test]
    fn route_imp_user_needs_extra_map() {
        let mut route = RouteMessage::new();
        route.imp_user = Some("alice".into());
        assert!(BoltRequest::Route(route.clone())
            .to_structure(BoltVersion::V4_3)
            .is_err());
        let s = BoltRequest::Route(route).to_structure(BoltVersion::V5_0).unwrap();
        assert_eq!(
            s.fields[2].as_map().unwrap().get("imp_user").unwrap().as_str(),
            Some("alice")
        );
    }

    #[test]
    fn route_rejected_before_v4_3() {
        assert!(matches!(
            BoltRequest::Route(RouteMessage::new()).to_structure(BoltVersion::V4_2),
            Err(BoltError::InvalidMessageForVersion { kind: "ROUTE", .. })
        ));
    }

    #[test]
    fn telemetry_gating_and_validation() {
        assert!(BoltRequest::Telemetry(1).to_structure(BoltVersion::V5_2).is_err());
        assert!(matches!(
            BoltRequest::Telemetry(-1).to_structure(BoltVersion::V5_4),
            Err(BoltError::InvalidExtraParameter(_))
        ));
        let s = BoltRequest::Telemetry(2).to_structure(BoltVersion::V5_4).unwrap();
        assert_eq!(s.signature, signature::TELEMETRY);
        assert_eq!(s.fields[0].as_int(), Some(2));
    }

    #[test]
    fn logon_logoff_gated_to_v5_1() {
        assert!(BoltRequest::Logon(AuthToken::basic("u", "p"))
            .to_structure(BoltVersion::V5_0)
            .is_err());
        let s = BoltRequest::Logon(AuthToken::basic("u", "p"))
            .to_structure(BoltVersion::V5_1)
            .unwrap();
        assert_eq!(s.signature, signature::LOGON);
        assert!(BoltRequest::Logoff.to_structure(BoltVersion::V5_1).is_ok());
    }

    #[test]
    fn goodbye_gated_to_v3() {
        assert!(BoltRequest::Goodbye.to_structure(BoltVersion::V2).is_err());
        let s = BoltRequest::Goodbye.to_structure(BoltVersion::V3).unwrap();
        assert!(s.fields.is_empty());
    }

    #[test]
    fn bearer_and_none_tokens() {
        let bearer = AuthToken::bearer("tok");
        let map = bearer.to_map();
        assert_eq!(map.get("scheme").unwrap().as_str(), Some("bearer"));
        assert_eq!(map.get("credentials").unwrap().as_str(), Some("tok"));
        assert!(!map.contains_key("principal"));

        assert_eq!(AuthToken::none().to_map().get("scheme").unwrap().as_str(), Some("none"));
    }
}
