use crate::catalog::SchemaState;

/// Scoped transaction over the live schema state.
///
/// Operations run against a staged copy. `commit` replaces the live state;
/// dropping the guard without committing discards every staged change.
pub struct SchemaTransaction<'a> {
    live: &'a mut SchemaState,
    staged: SchemaState,
}

impl<'a> SchemaTransaction<'a> {
    pub fn begin(live: &'a mut SchemaState) -> Self {
        let staged = live.clone();
        Self { live, staged }
    }

    pub fn state(&self) -> &SchemaState {
        &self.staged
    }

    pub fn state_mut(&mut self) -> &mut SchemaState {
        &mut self.staged
    }

    pub fn commit(self) {
        let Self { live, staged } = self;
        *live = staged;
    }
}
