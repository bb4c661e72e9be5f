//! Card content: the catalog of institutions and names, and the random picks made from it.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use rand::{Rng, RngCore};

use crate::foundation::color::Rgba8;
use crate::foundation::core::Size;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Everything the document compositor needs to draw one card.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentSpec {
    pub width: u32,
    pub height: u32,
    pub primary: Rgba8,
    pub secondary: Rgba8,
    pub institution_name: String,
    pub localized_name: String,
    pub address: String,
    pub display_name: String,
    /// Not drawn; carried so callers can label the generated card.
    pub gender: Gender,
    /// `YYYY-MM-DD`. Not drawn, like `gender`.
    pub date_of_birth: String,
    pub id_code: String,
    pub session: String,
    pub program: String,
    pub logo_url: Option<String>,
    pub portrait_url: String,
    /// Text of the faint diagonal watermark, drawn upper-cased.
    pub watermark_title: String,
}

impl DocumentSpec {
    pub fn size(&self) -> ForgeResult<Size> {
        Size::new(self.width, self.height)
    }
}

/// Produces the content of one card per call.
pub trait ContentProvider {
    fn document(&self, rng: &mut dyn RngCore) -> ForgeResult<DocumentSpec>;
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Institution {
    pub name: String,
    #[serde(default)]
    pub localized_name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    pub primary_color: Rgba8,
    pub secondary_color: Rgba8,
    pub address: String,
    /// Identifying-code template; every `#` becomes a random digit.
    pub id_template: String,
    /// Key into [`Catalog::programs`].
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GivenNames {
    pub male: Vec<String>,
    pub female: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Catalog {
    pub institutions: Vec<Institution>,
    pub given_names: GivenNames,
    pub surnames: Vec<String>,
    pub programs: HashMap<String, Vec<String>>,
    pub session: String,
    pub portrait_url: String,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> ForgeResult<Self> {
        let catalog: Self = serde_json::from_str(json).context("parse catalog json")?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_file(path: &Path) -> ForgeResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read catalog {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> ForgeResult<()> {
        if self.institutions.is_empty() {
            return Err(ForgeError::validation("catalog has no institutions"));
        }
        if self.given_names.male.is_empty() || self.given_names.female.is_empty() {
            return Err(ForgeError::validation(
                "catalog needs male and female given names",
            ));
        }
        if self.surnames.is_empty() {
            return Err(ForgeError::validation("catalog has no surnames"));
        }
        for inst in &self.institutions {
            match self.programs.get(&inst.kind) {
                Some(list) if !list.is_empty() => {}
                _ => {
                    return Err(ForgeError::validation(format!(
                        "institution {:?} has kind {:?} with no programs",
                        inst.name, inst.kind
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Identity {
    pub name: String,
    pub gender: Gender,
    /// `YYYY-MM-DD`.
    pub date_of_birth: String,
}

fn pick<'a, T>(items: &'a [T], rng: &mut dyn RngCore) -> ForgeResult<&'a T> {
    if items.is_empty() {
        return Err(ForgeError::validation("cannot pick from an empty list"));
    }
    Ok(&items[rng.random_range(0..items.len())])
}

/// Replace every `#` in `template` with an independent uniform digit. Other characters are kept.
pub fn generate_id_code(template: &str, rng: &mut dyn RngCore) -> String {
    template
        .chars()
        .map(|c| {
            if c == '#' {
                char::from(b'0' + rng.random_range(0..10u8))
            } else {
                c
            }
        })
        .collect()
}

/// Random person: 70% male, 30% female, born 1990..=1998 on a day 1..=28 of any month.
pub fn generate_identity(names: &GivenNames, surnames: &[String], rng: &mut dyn RngCore) -> ForgeResult<Identity> {
    let gender = if rng.random::<f64>() > 0.3 {
        Gender::Male
    } else {
        Gender::Female
    };
    let given = match gender {
        Gender::Male => pick(&names.male, rng)?,
        Gender::Female => pick(&names.female, rng)?,
    };
    let surname = pick(surnames, rng)?;
    let year = 1990 + rng.random_range(0..9u32);
    let month = rng.random_range(1..=12u32);
    let day = rng.random_range(1..=28u32);
    Ok(Identity {
        name: format!("{given} {surname}"),
        gender,
        date_of_birth: format!("{year}-{month:02}-{day:02}"),
    })
}

/// Draws every card field from a [`Catalog`].
#[derive(Clone, Debug)]
pub struct CatalogProvider {
    catalog: Catalog,
    card: Size,
}

impl CatalogProvider {
    pub fn new(catalog: Catalog, card: Size) -> ForgeResult<Self> {
        catalog.validate()?;
        Ok(Self { catalog, card })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl ContentProvider for CatalogProvider {
    fn document(&self, rng: &mut dyn RngCore) -> ForgeResult<DocumentSpec> {
        let inst = pick(&self.catalog.institutions, rng)?;
        let identity = generate_identity(&self.catalog.given_names, &self.catalog.surnames, rng)?;
        let id_code = generate_id_code(&inst.id_template, rng);
        let programs = self
            .catalog
            .programs
            .get(&inst.kind)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let program = pick(programs, rng)?.clone();

        Ok(DocumentSpec {
            width: self.card.width,
            height: self.card.height,
            primary: inst.primary_color,
            secondary: inst.secondary_color,
            institution_name: inst.name.clone(),
            localized_name: inst.localized_name.clone(),
            address: inst.address.clone(),
            display_name: identity.name,
            gender: identity.gender,
            date_of_birth: identity.date_of_birth,
            id_code,
            session: self.catalog.session.clone(),
            program,
            logo_url: inst.logo_url.clone(),
            portrait_url: self.catalog.portrait_url.clone(),
            watermark_title: inst.name.clone(),
        })
    }
}
