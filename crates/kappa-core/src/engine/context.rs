use crate::core::collision::CollisionEngine;
use crate::core::isotope::IsotopeScattering;
use crate::core::phonons::PhononSource;
use crate::core::symmetry::SymmetryMapper;

/// Handles to the external machinery a conductivity run drives.
///
/// The collision and isotope collaborators are stateful (they hold the
/// currently selected grid point), so they are borrowed mutably for the
/// lifetime of the run.
pub struct Collaborators<'a> {
    pub collision: &'a mut dyn CollisionEngine,
    pub phonons: &'a dyn PhononSource,
    pub symmetry: &'a dyn SymmetryMapper,
    pub isotope: Option<&'a mut dyn IsotopeScattering>,
}

impl<'a> Collaborators<'a> {
    pub fn new(
        collision: &'a mut dyn CollisionEngine,
        phonons: &'a dyn PhononSource,
        symmetry: &'a dyn SymmetryMapper,
    ) -> Self {
        Self {
            collision,
            phonons,
            symmetry,
            isotope: None,
        }
    }

    pub fn with_isotope(mut self, isotope: &'a mut dyn IsotopeScattering) -> Self {
        self.isotope = Some(isotope);
        self
    }
}
