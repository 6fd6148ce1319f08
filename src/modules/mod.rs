pub mod authors;
pub mod books;

use shelf_db::Database;
use shelf_kernel::ModuleRegistry;

/// Register all feature modules with the registry, sharing one database handle
pub fn register_all(registry: &mut ModuleRegistry, db: &Database) {
    registry.register(books::create_module(db));
    registry.register(authors::create_module(db));
}
