// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod service_area_handler {
    pub use crate::service_area_handler::*;
}

pub mod routes {
    pub use crate::routes::*;
}
