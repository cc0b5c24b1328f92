// Domain-layer modules and shared errors/models
pub mod filters {
    pub use crate::filters::*;
}

pub mod geometry {
    pub use crate::geometry::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod serializers {
    pub use crate::serializers::*;
}

pub mod errors {
    pub use crate::errors::*;
}
