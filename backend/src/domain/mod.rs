//! Domain primitives, entities and the services that mutate them.
//!
//! Purpose: define the campus entity kinds, the collection-keyed reactive
//! store and the single write path that the CLI drives. Everything here is
//! transport agnostic; adapters live under `outbound` and talk to the
//! domain through [`ports`].
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: failure payload shared by every operation.
//! - [`EntityStore`]: per-collection views with change notification.
//! - [`MutationGateway`]: create, status change and delete with ownership
//!   checks, over a [`LocalEntityBackend`] or [`RemoteEntityBackend`].
//! - [`AccountService`]: sign-up, sign-in and the explicit session.

pub mod account_service;
pub mod auth;
pub mod collection;
pub mod entities;
pub mod entity_filter;
pub mod entity_patch;
pub mod entity_store;
pub mod error;
pub mod local_backend;
pub mod membership;
pub mod mutation_gateway;
pub mod ports;
pub mod remote_backend;
pub mod user;

pub use self::account_service::AccountService;
pub use self::auth::{Credentials, CredentialsValidationError, SignUpRequest, PASSWORD_MIN_CHARS};
pub use self::collection::{
    CollectionName, CollectionOrdering, EntityId, EntityIdValidationError, SortDirection,
};
pub use self::entities::{
    Application, ApplicationDraft, ApplicationStatus, BorrowDraft, BorrowItem, BorrowKind,
    BorrowStatus, Condition, Emergency, EmergencyDraft, EmergencyKind, Entity, EntityDraft,
    Hackathon, HackathonDraft, HackathonStatus, HelpDraft, HelpRequest, HelpStatus,
    LostFoundDraft, LostFoundItem, LostFoundKind, MarketplaceDraft, MarketplaceItem, Post,
    PostDraft, PostEdit, PostKind, Record, TITLE_MAX,
};
pub use self::entity_filter::{EntityFilter, KindFilter};
pub use self::entity_patch::{Access, EntityPatch};
pub use self::entity_store::{CollectionView, EntityStore, StoreMode};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::local_backend::{LocalEntityBackend, QUARANTINE_SUFFIX};
pub use self::membership::MemberList;
pub use self::mutation_gateway::MutationGateway;
pub use self::remote_backend::{
    RemoteEntityBackend, SubscriptionSet, WriteConsistency, DEFAULT_CAS_ATTEMPTS,
};
pub use self::user::{
    Actor, CollegeEmail, ProfileUpdate, SessionContext, UserId, UserProfile, UserRole,
    UserValidationError,
};

/// Result alias for domain operations.
pub type DomainResult<T> = Result<T, Error>;
