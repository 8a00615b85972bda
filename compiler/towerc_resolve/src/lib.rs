pub mod call;
pub mod cancel;
pub mod candidate;
pub mod error;
pub mod resolution_candidate;
pub mod settings;
pub mod tower;

pub use call::{CallResolver, OverloadResolutionResults, ResolutionKind};
pub use cancel::CancellationToken;
pub use error::{ResolveError, ResolveResult, SettingsError};
pub use settings::TowerSettings;
pub use tower::{ImplicitScopeTower, TowerResolver};
