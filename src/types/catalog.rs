use serde::{Deserialize, Serialize};

/// Response envelope of the remote catalog: `{"data": [{"id": .., "attributes": {..}}]}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub data: Vec<Entry<T>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Entry<T> {
    pub id: i64,
    pub attributes: T,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MakeAttributes {
    pub make: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelAttributes {
    pub model: String,
}

/// A make as reported by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMake {
    pub id: i64,
    pub name: String,
}

/// A model as reported by the remote catalog, already filtered to one make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteModel {
    pub id: i64,
    pub name: String,
}

impl From<Entry<MakeAttributes>> for RemoteMake {
    fn from(e: Entry<MakeAttributes>) -> Self {
        Self {
            id: e.id,
            name: e.attributes.make,
        }
    }
}

impl From<&RemoteMake> for Entry<MakeAttributes> {
    fn from(m: &RemoteMake) -> Self {
        Self {
            id: m.id,
            attributes: MakeAttributes {
                make: m.name.clone(),
            },
        }
    }
}

impl From<Entry<ModelAttributes>> for RemoteModel {
    fn from(e: Entry<ModelAttributes>) -> Self {
        Self {
            id: e.id,
            name: e.attributes.model,
        }
    }
}

impl Envelope<MakeAttributes> {
    pub fn into_makes(self) -> Vec<RemoteMake> {
        self.data.into_iter().map(Into::into).collect()
    }

    pub fn from_makes(makes: &[RemoteMake]) -> Self {
        Self {
            data: makes.iter().map(Into::into).collect(),
        }
    }
}

impl Envelope<ModelAttributes> {
    pub fn into_models(self) -> Vec<RemoteModel> {
        self.data.into_iter().map(Into::into).collect()
    }
}
