use async_trait::async_trait;

use super::LocalityGateway;
use crate::{
    entities::{City, State},
    error::{upstream_error, Error},
};

/// IBGE localities service: Brazilian states and their municipalities.
pub struct Ibge {
    client: reqwest::Client,
    base: String,
}

impl Ibge {
    pub fn new(base: &str) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            base: base.trim_end_matches('/').into(),
        })
    }
}

#[async_trait]
impl LocalityGateway for Ibge {
    #[tracing::instrument(skip(self))]
    async fn states(&self) -> Result<Vec<State>, Error> {
        let url = format!("{}/api/v1/localidades/estados", self.base);

        let res = self
            .client
            .get(url)
            .query(&[("orderBy", "nome")])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(upstream_error());
        }

        let mut states: Vec<State> = res.json().await?;
        states.sort_by(|a, b| a.nome.cmp(&b.nome));

        Ok(states)
    }

    #[tracing::instrument(skip(self))]
    async fn cities(&self, state_id: u32) -> Result<Vec<City>, Error> {
        let url = format!(
            "{}/api/v1/localidades/estados/{}/municipios",
            self.base, state_id
        );

        let res = self
            .client
            .get(url)
            .query(&[("orderBy", "nome")])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(upstream_error());
        }

        let mut cities: Vec<City> = res.json().await?;
        cities.sort_by(|a, b| a.nome.cmp(&b.nome));

        Ok(cities)
    }
}

#[test]
fn decodes_ibge_payloads() {
    let states = r#"[
        {"id": 31, "sigla": "MG", "nome": "Minas Gerais", "regiao": {"id": 3, "sigla": "SE", "nome": "Sudeste"}},
        {"id": 12, "sigla": "AC", "nome": "Acre", "regiao": {"id": 1, "sigla": "N", "nome": "Norte"}}
    ]"#;
    let mut states: Vec<State> = serde_json::from_str(states).unwrap();
    states.sort_by(|a, b| a.nome.cmp(&b.nome));

    assert_eq!(states[0].nome, "Acre");
    assert_eq!(states[1].sigla, "MG");

    let cities = r#"[{"id": 3106200, "nome": "Belo Horizonte", "microrregiao": {"id": 31030}}]"#;
    let cities: Vec<City> = serde_json::from_str(cities).unwrap();
    assert_eq!(cities[0].id, 3106200);
}
