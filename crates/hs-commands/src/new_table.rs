//! NewTable command: register an empty table under a stable id.

use hs_core::Table;
use hs_engine::{
    Command, CommandBase, CommandContext, CommandError, ParamMap, Phase, PropertyStore, Request,
};

const ALLOWED: &[&str] = &["TableID", "Columns"];

/// Register an empty table with the given id and comma-separated column
/// names. Re-registering the same id replaces the table in place, keeping
/// its pool position.
pub struct NewTable {
    base: CommandBase,
}

impl NewTable {
    pub fn new(params: ParamMap) -> Self {
        Self {
            base: CommandBase::new("NewTable", params),
        }
    }

    pub fn boxed(params: ParamMap) -> Box<dyn Command> {
        Box::new(Self::new(params))
    }
}

impl Command for NewTable {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {
        self.base.check_allowed_params(ALLOWED);
        self.base.require_param("TableID");
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let phase = ctx.phase();
        if phase == Phase::Discovery {
            // Tables carry no series headers.
            self.base.set_discovery(Vec::new());
            return Ok(());
        }

        let raw_id = self.base.param("TableID").unwrap_or_default().to_string();
        let id = ctx.resolve(&raw_id).map_err(|e| {
            self.base.status.failure(
                phase,
                format!("Cannot resolve TableID: {}", e),
                "Define the referenced property before this command",
            );
            CommandError::Fatal { what: e.to_string() }
        })?;

        let columns: Vec<String> = self
            .base
            .params
            .get_or("Columns", "")
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        let table = Table::new(id.clone(), columns);
        ctx.request(Request::RegisterTable { table })
            .map_err(|e| CommandError::Fatal { what: e.to_string() })?;
        tracing::debug!(table = %id, "table registered");
        Ok(())
    }
}
