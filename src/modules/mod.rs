pub mod books;

use std::sync::Arc;

use books_db::BookStorage;
use books_kernel::ModuleRegistry;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: Arc<dyn BookStorage>) {
    registry.register(books::create_module(store));
}
