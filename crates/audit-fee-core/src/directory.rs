//! Built-in client and personnel directory used to prefill the client step.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::engagement::ClientType;
use crate::types::Money;

#[cfg(feature = "wizard")]
use crate::wizard::ClientInfo;

/// A client on file. Financial figures are in lakhs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: u32,
    pub client_name: &'static str,
    #[serde(rename = "CIN")]
    pub cin: &'static str,
    #[serde(rename = "PAN")]
    pub pan: &'static str,
    pub paid_up_capital: Money,
    pub latest_turnover: Money,
    pub borrowings: Money,
    pub net_profit: Money,
    pub sector: &'static str,
    /// Display name as held on file, e.g. "List Company"
    #[serde(rename = "clientType")]
    pub client_type_name: &'static str,
}

impl ClientRecord {
    pub fn client_type(&self) -> ClientType {
        ClientType::coerce(self.client_type_name)
    }

    #[cfg(feature = "wizard")]
    pub fn to_client_info(&self) -> ClientInfo {
        ClientInfo {
            client_name: self.client_name.to_string(),
            client_id: Some(self.id),
            cin: self.cin.to_string(),
            pan: self.pan.to_string(),
            paid_up_capital: Some(self.paid_up_capital),
            latest_turnover: Some(self.latest_turnover),
            borrowings: Some(self.borrowings),
            net_profit: Some(self.net_profit),
            sector: self.sector.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonnelRecord {
    pub id: u32,
    pub name: &'static str,
    pub membership_number: &'static str,
    pub designation: &'static str,
    pub experience: u32,
    /// "partner" or "manager"
    pub role: &'static str,
    pub specialization: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
}

const fn client(
    id: u32,
    client_name: &'static str,
    cin: &'static str,
    pan: &'static str,
    figures: [Decimal; 4],
    sector: &'static str,
    client_type_name: &'static str,
) -> ClientRecord {
    ClientRecord {
        id,
        client_name,
        cin,
        pan,
        paid_up_capital: figures[0],
        latest_turnover: figures[1],
        borrowings: figures[2],
        net_profit: figures[3],
        sector,
        client_type_name,
    }
}

static CLIENTS: [ClientRecord; 7] = [
    client(
        1,
        "ABC Manufacturing Ltd.",
        "L12345MH2010PLC123456",
        "ABCDE1234F",
        [dec!(1500), dec!(8500), dec!(2500), dec!(950)],
        "Manufacturing",
        "Private Company",
    ),
    client(
        2,
        "XYZ Technology Solutions Pvt. Ltd.",
        "U67890MH2015PTC234567",
        "XYZAB5678G",
        [dec!(800), dec!(4500), dec!(1200), dec!(620)],
        "Information Technology",
        "Private Company",
    ),
    client(
        3,
        "Global Finance India Ltd.",
        "L34567MH2008PLC345678",
        "GLOFI7890H",
        [dec!(5000), dec!(25000), dec!(12000), dec!(3500)],
        "Financial Services",
        "List Company",
    ),
    client(
        4,
        "Green Energy Solutions LLP",
        "AAB-1234",
        "GRENE9012I",
        [dec!(300), dec!(1800), dec!(450), dec!(220)],
        "Renewable Energy",
        "LLP",
    ),
    client(
        5,
        "Healthcare Initiatives Trust",
        "NA",
        "HEALT1234J",
        [dec!(100), dec!(850), dec!(100), dec!(0)],
        "Healthcare",
        "Section 8 Company or Trust",
    ),
    client(
        6,
        "National Infrastructure Corporation",
        "L56789MH2000PLC456789",
        "NATIN5678K",
        [dec!(10000), dec!(45000), dec!(18000), dec!(5200)],
        "Infrastructure",
        "Public Company",
    ),
    client(
        7,
        "Small Manufacturing Company",
        "U98765MH2018PTC567890",
        "SMALL9012L",
        [dec!(50), dec!(650), dec!(180), dec!(75)],
        "Manufacturing",
        "SMC Company",
    ),
];

static PERSONNEL: [PersonnelRecord; 7] = [
    PersonnelRecord {
        id: 101,
        name: "Rajiv Sharma",
        membership_number: "M-12345",
        designation: "Partner, Engagement Partner",
        experience: 18,
        role: "partner",
        specialization: "Manufacturing, Retail",
        email: "rajiv.sharma@firm.com",
        phone: "+91 98765 43210",
    },
    PersonnelRecord {
        id: 102,
        name: "Priya Mehta",
        membership_number: "M-23456",
        designation: "Partner, Engagement Partner",
        experience: 15,
        role: "partner",
        specialization: "Financial Services, Technology",
        email: "priya.mehta@firm.com",
        phone: "+91 98765 43211",
    },
    PersonnelRecord {
        id: 103,
        name: "Amit Kapoor",
        membership_number: "M-34567",
        designation: "Partner, Concurring Partner",
        experience: 16,
        role: "partner",
        specialization: "Healthcare, Infrastructure",
        email: "amit.kapoor@firm.com",
        phone: "+91 98765 43212",
    },
    PersonnelRecord {
        id: 104,
        name: "Deepa Jain",
        membership_number: "M-45678",
        designation: "Partner, Concurring Partner",
        experience: 14,
        role: "partner",
        specialization: "Technology, Energy",
        email: "deepa.jain@firm.com",
        phone: "+91 98765 43213",
    },
    PersonnelRecord {
        id: 201,
        name: "Rahul Gupta",
        membership_number: "M-56789",
        designation: "Audit Manager",
        experience: 8,
        role: "manager",
        specialization: "Manufacturing, Retail",
        email: "rahul.gupta@firm.com",
        phone: "+91 98765 43214",
    },
    PersonnelRecord {
        id: 202,
        name: "Neha Singh",
        membership_number: "M-67890",
        designation: "Audit Manager",
        experience: 7,
        role: "manager",
        specialization: "Financial Services, Technology",
        email: "neha.singh@firm.com",
        phone: "+91 98765 43215",
    },
    PersonnelRecord {
        id: 203,
        name: "Vikram Malhotra",
        membership_number: "M-78901",
        designation: "Audit Manager",
        experience: 9,
        role: "manager",
        specialization: "Healthcare, Infrastructure",
        email: "vikram.malhotra@firm.com",
        phone: "+91 98765 43216",
    },
];

pub fn clients() -> &'static [ClientRecord] {
    &CLIENTS
}

pub fn personnel() -> &'static [PersonnelRecord] {
    &PERSONNEL
}

/// Case-insensitive substring match on name, CIN or PAN. Blank queries
/// match nothing.
pub fn search_clients(query: &str) -> Vec<&'static ClientRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    CLIENTS
        .iter()
        .filter(|c| {
            c.client_name.to_lowercase().contains(&needle)
                || c.cin.to_lowercase().contains(&needle)
                || c.pan.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn client_by_id(id: u32) -> Option<&'static ClientRecord> {
    CLIENTS.iter().find(|c| c.id == id)
}

pub fn personnel_by_id(id: u32) -> Option<&'static PersonnelRecord> {
    PERSONNEL.iter().find(|p| p.id == id)
}

pub fn personnel_by_role(role: &str) -> Vec<&'static PersonnelRecord> {
    let role = role.trim();
    PERSONNEL
        .iter()
        .filter(|p| p.role.eq_ignore_ascii_case(role))
        .collect()
}

fn with_designation(title: &str) -> Vec<&'static PersonnelRecord> {
    PERSONNEL
        .iter()
        .filter(|p| p.designation.contains(title))
        .collect()
}

pub fn engagement_partners() -> Vec<&'static PersonnelRecord> {
    with_designation("Engagement Partner")
}

pub fn concurring_partners() -> Vec<&'static PersonnelRecord> {
    with_designation("Concurring Partner")
}

pub fn audit_managers() -> Vec<&'static PersonnelRecord> {
    personnel_by_role("manager")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_by_name_cin_and_pan() {
        let hits = search_clients("manufacturing");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 7);

        assert_eq!(search_clients("plc345678")[0].client_name, "Global Finance India Ltd.");
        assert_eq!(search_clients("grene9012i")[0].id, 4);
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        assert!(search_clients("").is_empty());
        assert!(search_clients("   ").is_empty());
        assert!(search_clients("zzz-no-such-client").is_empty());
    }

    #[test]
    fn test_client_types_resolve() {
        assert_eq!(client_by_id(3).unwrap().client_type(), ClientType::Listed);
        assert_eq!(client_by_id(5).unwrap().client_type(), ClientType::Section8);
        assert_eq!(client_by_id(7).unwrap().client_type(), ClientType::Smc);
        assert_eq!(client_by_id(4).unwrap().client_type(), ClientType::Llp);
        assert!(client_by_id(99).is_none());
    }

    #[test]
    fn test_personnel_lookups() {
        assert_eq!(personnel_by_id(203).unwrap().name, "Vikram Malhotra");
        assert_eq!(personnel_by_role("PARTNER").len(), 4);
        assert_eq!(audit_managers().len(), 3);

        let engagement: Vec<u32> = engagement_partners().iter().map(|p| p.id).collect();
        assert_eq!(engagement, vec![101, 102]);
        let concurring: Vec<u32> = concurring_partners().iter().map(|p| p.id).collect();
        assert_eq!(concurring, vec![103, 104]);
    }

    #[test]
    fn test_record_wire_names() {
        let json = serde_json::to_value(client_by_id(1).unwrap()).unwrap();
        assert_eq!(json["CIN"], "L12345MH2010PLC123456");
        assert_eq!(json["clientType"], "Private Company");
        assert_eq!(json["latestTurnover"], "8500");
    }
}
