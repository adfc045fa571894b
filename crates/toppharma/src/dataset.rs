//! A complete in-memory directory: entities plus their join rows.
//!
//! The demo dataset backs the mock data source and `toppharma db seed`.

use serde::Serialize;

use crate::model::{Company, Product, TherapeuticArea, Website};
use crate::storage::{Link, Relation};
use crate::text::slugify;

/// Entities and relations of one directory snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    /// Companies.
    pub companies: Vec<Company>,
    /// Products.
    pub products: Vec<Product>,
    /// Websites.
    pub websites: Vec<Website>,
    /// Therapeutic areas.
    pub therapeutic_areas: Vec<TherapeuticArea>,
    /// Company to therapeutic area links.
    pub company_areas: Vec<Link>,
    /// Product to therapeutic area links.
    pub product_areas: Vec<Link>,
    /// Product to website links.
    pub product_websites: Vec<Link>,
}

impl Dataset {
    /// The join rows of one relation.
    #[must_use]
    pub fn links(&self, relation: Relation) -> &[Link] {
        match relation {
            Relation::CompanyTherapeuticArea => &self.company_areas,
            Relation::ProductTherapeuticArea => &self.product_areas,
            Relation::ProductWebsite => &self.product_websites,
        }
    }

    /// Copy the join rows onto each company's and product's
    /// `therapeutic_areas` list. Websites take their company's areas.
    pub fn fill_therapeutic_areas(&mut self) {
        for company in &mut self.companies {
            company.therapeutic_areas = right_ids(&self.company_areas, &company.id);
        }
        for product in &mut self.products {
            product.therapeutic_areas = right_ids(&self.product_areas, &product.id);
        }
        for website in &mut self.websites {
            website.therapeutic_areas = website
                .company_id
                .as_deref()
                .map(|id| right_ids(&self.company_areas, id))
                .unwrap_or_default();
        }
    }

    /// A small directory of well-known companies for demos and tests.
    #[must_use]
    pub fn demo() -> Self {
        let therapeutic_areas = vec![
            area("oncology", "Oncology", "The branch of medicine that deals with the study, treatment, diagnosis, and prevention of cancer."),
            area("immunology", "Immunology", "The study of the immune system and its response to infectious disease."),
            area("neuroscience", "Neuroscience", "The scientific study of the nervous system and brain."),
            area("vaccines", "Vaccines", "Biological preparations that provide active acquired immunity."),
            area("cardiovascular", "Cardiovascular", "Diseases of the heart and blood vessels."),
        ];

        let companies = vec![
            Company {
                description: Some("A leading pharmaceutical company focused on developing innovative therapies.".into()),
                logo_url: Some("/images/logos/pfizer.png".into()),
                website: Some("https://www.pfizer.com".into()),
                founded: Some(1849),
                employees: Some(88_000),
                market_cap: Some(200.5),
                ticker_symbol: Some("PFE".into()),
                stock_exchange: Some("NYSE".into()),
                ownership_type: Some("public".into()),
                ..company("pfizer", "Pfizer", "New York, USA", "2024-03-02T10:00:00Z")
            },
            Company {
                description: Some("A global healthcare company based in Switzerland.".into()),
                logo_url: Some("/images/logos/novartis.png".into()),
                website: Some("https://www.novartis.com".into()),
                founded: Some(1996),
                employees: Some(103_000),
                market_cap: Some(180.7),
                ticker_symbol: Some("NVS".into()),
                stock_exchange: Some("NYSE".into()),
                ownership_type: Some("public".into()),
                ..company("novartis", "Novartis", "Basel, Switzerland", "2024-03-05T09:30:00Z")
            },
            Company {
                description: Some("Swiss healthcare company pioneering pharmaceuticals and diagnostics.".into()),
                website: Some("https://www.roche.com".into()),
                founded: Some(1896),
                employees: Some(101_000),
                market_cap: Some(320.7),
                ticker_symbol: Some("ROG".into()),
                stock_exchange: Some("SIX".into()),
                ownership_type: Some("public".into()),
                ..company("roche", "Roche", "Basel, Switzerland", "2024-02-20T14:15:00Z")
            },
            Company {
                description: Some("Known as MSD outside the United States and Canada.".into()),
                website: Some("https://www.merck.com".into()),
                founded: Some(1891),
                employees: Some(71_000),
                market_cap: Some(180.2),
                ticker_symbol: Some("MRK".into()),
                stock_exchange: Some("NYSE".into()),
                ownership_type: Some("public".into()),
                ..company("merck", "Merck", "Kenilworth, USA", "2024-01-11T08:00:00Z")
            },
        ];

        let products = vec![
            Product {
                generic_name: Some("COVID-19 mRNA vaccine".into()),
                description: Some("COVID-19 vaccine based on mRNA technology".into()),
                molecule_type: Some("mRNA vaccine".into()),
                year: Some(2021),
                indications: vec!["COVID-19 prevention".into()],
                ..product("product1", "Comirnaty", "pfizer", "market", "2024-03-04T12:00:00Z")
            },
            Product {
                generic_name: Some("palbociclib".into()),
                description: Some("Treatment for HR+/HER2- metastatic breast cancer".into()),
                year: Some(2015),
                ..product("ibrance", "Ibrance", "pfizer", "market", "2024-02-01T12:00:00Z")
            },
            Product {
                generic_name: Some("ribociclib".into()),
                description: Some("Treatment for breast cancer".into()),
                year: Some(2017),
                ..product("kisqali", "Kisqali", "novartis", "market", "2024-03-01T12:00:00Z")
            },
            Product {
                generic_name: Some("sacubitril/valsartan".into()),
                description: Some("Treatment for heart failure".into()),
                year: Some(2015),
                ..product("entresto", "Entresto", "novartis", "market", "2024-01-15T12:00:00Z")
            },
            Product {
                generic_name: Some("secukinumab".into()),
                description: Some("Treatment for psoriasis, psoriatic arthritis, and ankylosing spondylitis".into()),
                year: Some(2015),
                ..product("cosentyx", "Cosentyx", "novartis", "market", "2023-12-10T12:00:00Z")
            },
            Product {
                generic_name: Some("pelacarsen".into()),
                description: Some("Investigational therapy lowering lipoprotein(a)".into()),
                ..product("pelacarsen", "Pelacarsen", "novartis", "phase3", "2024-03-06T12:00:00Z")
            },
            Product {
                generic_name: Some("atezolizumab".into()),
                description: Some("Immunotherapy for various cancer types".into()),
                year: Some(2016),
                ..product("tecentriq", "Tecentriq", "roche", "market", "2024-02-18T12:00:00Z")
            },
            Product {
                generic_name: Some("ocrelizumab".into()),
                description: Some("Treatment for multiple sclerosis".into()),
                year: Some(2017),
                ..product("ocrevus", "Ocrevus", "roche", "market", "2023-11-30T12:00:00Z")
            },
            Product {
                generic_name: Some("pembrolizumab".into()),
                description: Some("Immunotherapy for various cancer types".into()),
                year: Some(2014),
                ..product("keytruda", "Keytruda", "merck", "market", "2024-02-25T12:00:00Z")
            },
            Product {
                generic_name: Some("human papillomavirus vaccine".into()),
                description: Some("Vaccine for human papillomavirus".into()),
                year: Some(2006),
                ..product("gardasil", "Gardasil", "merck", "market", "2023-10-05T12:00:00Z")
            },
        ];

        let websites = vec![
            Website {
                site_name: Some("Pfizer Corporate Website".into()),
                description: Some("The main corporate website for Pfizer Inc.".into()),
                screenshot_url: Some("/images/screenshots/pfizer-com.jpg".into()),
                ..website("website1", "pfizer.com", "corporate", "pfizer", "2024-03-01T00:00:00Z")
            },
            Website {
                site_name: Some("Novartis".into()),
                description: Some("Corporate website of Novartis AG.".into()),
                ..website("novartis-com", "novartis.com", "corporate", "novartis", "2024-02-10T00:00:00Z")
            },
            Website {
                site_name: Some("Roche".into()),
                ..website("roche-com", "roche.com", "corporate", "roche", "2024-01-20T00:00:00Z")
            },
            Website {
                site_name: Some("Comirnaty".into()),
                description: Some("Product information for Comirnaty.".into()),
                ..website("comirnaty-com", "comirnaty.com", "product", "pfizer", "2024-02-28T00:00:00Z")
            },
            Website {
                site_name: Some("Keytruda".into()),
                description: Some("Patient and prescriber information for Keytruda.".into()),
                ..website("keytruda-com", "keytruda.com", "product", "merck", "2024-03-03T00:00:00Z")
            },
        ];

        let company_areas = links(&[
            ("pfizer", "oncology"),
            ("pfizer", "immunology"),
            ("pfizer", "vaccines"),
            ("novartis", "oncology"),
            ("novartis", "immunology"),
            ("novartis", "neuroscience"),
            ("novartis", "cardiovascular"),
            ("roche", "oncology"),
            ("roche", "immunology"),
            ("roche", "neuroscience"),
            ("merck", "oncology"),
            ("merck", "vaccines"),
            ("merck", "cardiovascular"),
        ]);

        let product_areas = links(&[
            ("product1", "vaccines"),
            ("ibrance", "oncology"),
            ("kisqali", "oncology"),
            ("entresto", "cardiovascular"),
            ("cosentyx", "immunology"),
            ("pelacarsen", "cardiovascular"),
            ("tecentriq", "oncology"),
            ("tecentriq", "immunology"),
            ("ocrevus", "neuroscience"),
            ("keytruda", "oncology"),
            ("keytruda", "immunology"),
            ("gardasil", "vaccines"),
        ]);

        let product_websites = links(&[
            ("product1", "comirnaty-com"),
            ("product1", "website1"),
            ("keytruda", "keytruda-com"),
        ]);

        let mut dataset = Self {
            companies,
            products,
            websites,
            therapeutic_areas,
            company_areas,
            product_areas,
            product_websites,
        };
        dataset.fill_therapeutic_areas();
        dataset
    }
}

fn right_ids(links: &[Link], left: &str) -> Vec<String> {
    links
        .iter()
        .filter(|l| l.left == left)
        .map(|l| l.right.clone())
        .collect()
}

fn links(pairs: &[(&str, &str)]) -> Vec<Link> {
    pairs.iter().map(|(l, r)| Link::new(*l, *r)).collect()
}

fn area(id: &str, name: &str, description: &str) -> TherapeuticArea {
    TherapeuticArea {
        id: id.into(),
        name: name.into(),
        slug: slugify(name),
        description: description.into(),
        icon_path: Some(format!("/images/icons/{id}.svg")),
        created_at: Some("2023-01-01T00:00:00Z".into()),
        updated_at: Some("2023-01-01T00:00:00Z".into()),
    }
}

fn company(id: &str, name: &str, headquarters: &str, updated_at: &str) -> Company {
    Company {
        id: id.into(),
        name: name.into(),
        slug: slugify(name),
        headquarters: Some(headquarters.into()),
        created_at: Some("2023-01-01T00:00:00Z".into()),
        updated_at: Some(updated_at.into()),
        ..Company::default()
    }
}

fn product(id: &str, name: &str, company_id: &str, stage: &str, updated_at: &str) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        slug: slugify(name),
        company_id: Some(company_id.into()),
        stage: Some(stage.into()),
        status: Some(if stage == "market" { "Approved" } else { "Investigational" }.into()),
        created_at: Some("2023-01-01T00:00:00Z".into()),
        updated_at: Some(updated_at.into()),
        ..Product::default()
    }
}

fn website(id: &str, domain: &str, category: &str, company_id: &str, created_at: &str) -> Website {
    Website {
        id: id.into(),
        slug: crate::text::domain_slug(domain),
        domain: domain.into(),
        category: Some(category.into()),
        company_id: Some(company_id.into()),
        url: Some(format!("https://www.{domain}")),
        has_ssl: Some(true),
        status: Some("active".into()),
        created_at: Some(created_at.into()),
        updated_at: Some(created_at.into()),
        ..Website::default()
    }
}
