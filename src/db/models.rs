use crate::types::export::{ExportMake, ExportModel};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DbMake {
    pub id: i64,
    #[sqlx(rename = "make")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DbModel {
    pub id: i64,
    pub make_id: i64,
    #[sqlx(rename = "model")]
    pub name: String,
}

impl From<DbModel> for ExportModel {
    fn from(m: DbModel) -> Self {
        ExportModel::new(m.id, m.name)
    }
}

impl DbMake {
    pub fn into_export(self, models: Vec<DbModel>) -> ExportMake {
        ExportMake::new(
            self.id,
            self.name,
            models.into_iter().map(Into::into).collect(),
        )
    }
}
