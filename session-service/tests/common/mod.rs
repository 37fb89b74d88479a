use std::sync::Arc;
use std::sync::Mutex;

use auth::HashingCost;
use auth::SecretHasher;
use auth::SigningKey;
use auth::SigningKeySet;
use auth::TokenCodec;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use session_service::domain::session::models::EmailAddress;
use session_service::domain::session::models::Principal;
use session_service::domain::session::models::PrincipalId;
use session_service::domain::session::ports::Clock;
use session_service::outbound::directory::InMemoryUserDirectory;
use session_service::outbound::revocation::InMemoryRevocationStore;
use session_service::AuthService;
use session_service::SessionPolicy;
use session_service::SessionValidator;

pub const SIGNING_SECRET: &[u8] = b"test-secret-key-for-token-signing-at-least-32-bytes";

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Service wired against in-memory adapters
pub struct TestApp {
    pub service: AuthService<InMemoryUserDirectory>,
    pub directory: Arc<InMemoryUserDirectory>,
    pub revocations: Option<Arc<InMemoryRevocationStore>>,
    pub codec: Arc<TokenCodec>,
    pub clock: Arc<ManualClock>,
    pub hasher: SecretHasher,
}

pub struct TestAppBuilder {
    stateful: bool,
    policy: SessionPolicy,
    memory_kib: u32,
}

impl TestAppBuilder {
    pub fn stateless(mut self) -> Self {
        self.stateful = false;
        self
    }

    pub fn policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn memory_kib(mut self, memory_kib: u32) -> Self {
        self.memory_kib = memory_kib;
        self
    }

    pub fn build(self) -> TestApp {
        let hasher = SecretHasher::with_cost(HashingCost {
            iterations: 1,
            memory_kib: self.memory_kib,
            parallelism: 1,
        })
        .expect("Failed to build hasher");

        let key = SigningKey::new("test", SIGNING_SECRET.to_vec()).expect("valid key");
        let codec = Arc::new(TokenCodec::new(SigningKeySet::single(key)));
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let directory = Arc::new(InMemoryUserDirectory::new());

        let mut validator = SessionValidator::new(Arc::clone(&codec)).with_clock(clock.clone());
        let revocations = if self.stateful {
            let store = Arc::new(InMemoryRevocationStore::new());
            validator = validator.with_revocation_store(store.clone());
            Some(store)
        } else {
            None
        };

        let service = AuthService::new(
            Arc::clone(&directory),
            validator,
            hasher.clone(),
            self.policy,
        )
        .expect("Failed to build service");

        TestApp {
            service,
            directory,
            revocations,
            codec,
            clock,
            hasher,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            stateful: true,
            policy: SessionPolicy::default(),
            memory_kib: 1024,
        }
    }

    /// Stateful app with default policy
    pub fn spawn() -> Self {
        Self::builder().build()
    }

    /// Register a principal with the given email and secret
    pub fn add_principal(&self, email: &str, secret: &str) -> PrincipalId {
        let principal = Principal {
            id: PrincipalId::new(),
            email: EmailAddress::normalize(email),
            secret_hash: self.hasher.hash(secret).expect("Failed to hash secret"),
            created_at: Utc::now(),
        };
        let id = principal.id;
        self.directory.insert(principal);
        id
    }
}
