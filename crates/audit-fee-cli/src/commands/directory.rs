use clap::Args;
use serde_json::Value;

use audit_fee_core::directory;

/// Arguments for the client directory lookup
#[derive(Args)]
pub struct ClientsArgs {
    /// Case-insensitive search over name, CIN and PAN
    #[arg(long)]
    pub query: Option<String>,

    /// Look up a single client by id
    #[arg(long, conflicts_with = "query")]
    pub id: Option<u32>,
}

pub fn run_clients(args: ClientsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(id) = args.id {
        let client = directory::client_by_id(id).ok_or(format!("no client with id {id}"))?;
        return Ok(serde_json::to_value(client)?);
    }
    let hits = match args.query {
        Some(ref q) => directory::search_clients(q),
        None => directory::clients().iter().collect(),
    };
    Ok(serde_json::to_value(hits)?)
}

/// Arguments for the personnel directory lookup
#[derive(Args)]
pub struct PersonnelArgs {
    /// Look up one person by id
    #[arg(long)]
    pub id: Option<u32>,

    /// Filter by role (partner or manager)
    #[arg(long)]
    pub role: Option<String>,

    /// Only partners who can lead an engagement
    #[arg(long)]
    pub engagement_partners: bool,

    /// Only partners who can act as concurring partner
    #[arg(long)]
    pub concurring_partners: bool,

    /// Only audit managers
    #[arg(long)]
    pub managers: bool,
}

pub fn run_personnel(args: PersonnelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(id) = args.id {
        let person = directory::personnel_by_id(id).ok_or(format!("no personnel with id {id}"))?;
        return Ok(serde_json::to_value(person)?);
    }
    let people = if args.engagement_partners {
        directory::engagement_partners()
    } else if args.concurring_partners {
        directory::concurring_partners()
    } else if args.managers {
        directory::audit_managers()
    } else if let Some(ref role) = args.role {
        directory::personnel_by_role(role)
    } else {
        directory::personnel().iter().collect()
    };
    Ok(serde_json::to_value(people)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personnel_args() -> PersonnelArgs {
        PersonnelArgs {
            id: None,
            role: None,
            engagement_partners: false,
            concurring_partners: false,
            managers: false,
        }
    }

    #[test]
    fn test_client_search_and_lookup() {
        let hits = run_clients(ClientsArgs {
            query: Some("ltd".into()),
            id: None,
        })
        .unwrap();
        assert_eq!(hits.as_array().unwrap().len(), 3);

        let one = run_clients(ClientsArgs {
            query: None,
            id: Some(6),
        })
        .unwrap();
        assert_eq!(one["clientName"], "National Infrastructure Corporation");
        assert!(run_clients(ClientsArgs { query: None, id: Some(42) }).is_err());
    }

    #[test]
    fn test_personnel_filters() {
        let all = run_personnel(personnel_args()).unwrap();
        assert_eq!(all.as_array().unwrap().len(), 7);

        let mut args = personnel_args();
        args.managers = true;
        let managers = run_personnel(args).unwrap();
        assert_eq!(managers.as_array().unwrap().len(), 3);

        let mut args = personnel_args();
        args.id = Some(102);
        assert_eq!(run_personnel(args).unwrap()["name"], "Priya Mehta");
    }
}
