mod craft;
mod projectile;

pub use craft::Craft;
pub use projectile::Projectile;
