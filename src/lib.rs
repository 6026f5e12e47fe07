//! Three dimensional simple, ordinary and universal kriging of point and block targets.

pub mod error;
pub mod geometry;
pub mod kriging;
pub mod spatial_database;
pub mod systems;
pub mod variography;

pub mod prelude {

    pub mod re_exports {
        pub use nalgebra;
        pub use rstar;
    }

    pub use crate::error::{Error, Result};
    pub use crate::geometry::{anisotropy::Anisotropy, support::Support};
    pub use crate::kriging::{
        cancellation::CancellationToken,
        cross_validation::{CrossValidation, CrossValidationSummary},
        estimator::{Estimator, EstimatorOptions},
        grid::GridDefinition,
        EstimationOutput, EstimationResult, RunStatus, RunSummary, TargetStatus,
    };
    pub use crate::spatial_database::{
        rtree_point_set::point_set::SampleSet, OctantAxes, Sample, SearchParameters,
    };
    pub use crate::systems::{DriftTerms, KrigingType};
    pub use crate::variography::model_variograms::{
        composite::{CompositeVariogram, StructureKind, StructureSpec},
        VariogramModel,
    };
}
