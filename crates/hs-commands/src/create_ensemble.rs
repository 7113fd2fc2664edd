//! CreateEnsemble command: group existing series under an ensemble id.

use crate::common::resolve_selection;
use hs_core::Ensemble;
use hs_engine::{
    Command, CommandBase, CommandContext, CommandError, ParamMap, Phase, PropertyStore,
};

const ALLOWED: &[&str] = &["EnsembleID", "Name", "TSList", "TSID"];

/// Group the selected series into an ensemble. Members are recorded by
/// stable pool position; the series themselves are not copied.
pub struct CreateEnsemble {
    base: CommandBase,
}

impl CreateEnsemble {
    pub fn new(params: ParamMap) -> Self {
        Self {
            base: CommandBase::new("CreateEnsemble", params),
        }
    }

    pub fn boxed(params: ParamMap) -> Box<dyn Command> {
        Box::new(Self::new(params))
    }
}

impl Command for CreateEnsemble {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {
        self.base.check_allowed_params(ALLOWED);
        self.base.require_param("EnsembleID");
        if self
            .base
            .params
            .get_or("TSList", "AllTS")
            .eq_ignore_ascii_case("EnsembleID")
        {
            self.base.status.failure(
                Phase::Initialization,
                "TSList=EnsembleID cannot be used to create an ensemble",
                "Select input series by TSID pattern or AllTS",
            );
        }
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let phase = ctx.phase();
        if phase == Phase::Discovery {
            self.base.set_discovery(Vec::new());
            return Ok(());
        }

        let raw_id = self.base.param("EnsembleID").unwrap_or_default().to_string();
        let id = ctx.resolve(&raw_id).map_err(|e| {
            self.base.status.failure(
                phase,
                format!("Cannot resolve EnsembleID: {}", e),
                "Define the referenced property before this command",
            );
            CommandError::Fatal { what: e.to_string() }
        })?;
        let name = match self.base.param("Name").filter(|v| !v.is_empty()) {
            Some(raw) => ctx
                .resolve(raw)
                .map_err(|e| CommandError::Fatal { what: e.to_string() })?,
            None => id.clone(),
        };

        let members = resolve_selection(&mut self.base, ctx)?;
        if members.is_empty() {
            self.base.status.warning(
                phase,
                format!("Ensemble {} created with no members", id),
                "Verify that upstream commands produce the expected series",
            );
        }
        ctx.append_ensemble(Ensemble { id, name, members });
        Ok(())
    }
}
