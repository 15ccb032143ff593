pub mod bullet;
pub mod interactive;
pub mod item;
pub mod npc;

pub use bullet::Bullet;
pub use interactive::Interactive;
pub use item::{Inventory, Item};
pub use npc::{Npc, PerceptionRecord, ProcessPolicy, SensesBit, WeaponState};
