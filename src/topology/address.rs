use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use strum_macros::Display;
use utoipa::ToSchema;

/// First octet of ground-satellite link subnets.
const GSL_NET: u8 = 9;
/// First octet of inter-satellite link subnets.
const ISL_NET: u8 = 10;

const GSL_SATELLITE_HOST: u8 = 50;
const GSL_GROUND_HOST: u8 = 60;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display,
)]
pub enum NodeCategory {
    #[strum(serialize = "sat")]
    #[serde(rename = "sat")]
    Satellite,
    #[strum(serialize = "gs")]
    #[serde(rename = "gs")]
    GroundStation,
}

impl NodeCategory {
    /// Upper-case tag used in path lines.
    pub fn label(&self) -> &'static str {
        match self {
            NodeCategory::Satellite => "SAT",
            NodeCategory::GroundStation => "GS",
        }
    }
}

/// A node in the flat index space: satellites first, ground stations after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct NodeAddress {
    pub category: NodeCategory,
    pub index: usize,
}

impl NodeAddress {
    pub fn satellite(index: usize) -> Self {
        Self {
            category: NodeCategory::Satellite,
            index,
        }
    }

    pub fn ground_station(index: usize) -> Self {
        Self {
            category: NodeCategory::GroundStation,
            index,
        }
    }

    pub fn is_satellite(&self) -> bool {
        self.category == NodeCategory::Satellite
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.category, self.index)
    }
}

/// Which side of a ground-satellite link an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GslEndpoint {
    Satellite,
    Ground,
}

/// Each satellite owns two inter-satellite links: one along its orbit and
/// one towards the neighbouring orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IslLink {
    IntraOrbit,
    InterOrbit,
}

impl IslLink {
    fn offset(&self) -> usize {
        match self {
            IslLink::IntraOrbit => 1,
            IslLink::InterOrbit => 2,
        }
    }

    /// Host octet of the owning satellite's interface.
    fn owner_host(&self) -> u8 {
        match self {
            IslLink::IntraOrbit => 40,
            IslLink::InterOrbit => 30,
        }
    }
}

/// Maps between flat node indices and the emulator's IPv4 plan.
///
/// * `9.X.Y.50` is satellite `Y` on its link to ground station `X + N`.
/// * `9.X.Y.60` is ground station `X + N` on its link to satellite `Y`.
/// * `10.X.Y.*` belongs to link number `(X << 8) | Y`, owned by satellite
///   `(link - 1) / 2 + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addressing {
    constellation_size: usize,
    ground_station_count: usize,
}

impl Addressing {
    pub fn new(constellation_size: usize, ground_station_count: usize) -> Self {
        Self {
            constellation_size,
            ground_station_count,
        }
    }

    pub fn constellation_size(&self) -> usize {
        self.constellation_size
    }

    pub fn ground_station_count(&self) -> usize {
        self.ground_station_count
    }

    /// Classifies a flat index, `None` when it is out of range.
    pub fn node(&self, index: usize) -> Option<NodeAddress> {
        let n = self.constellation_size;
        if (1..=n).contains(&index) {
            Some(NodeAddress::satellite(index))
        } else if index > n && index <= n + self.ground_station_count {
            Some(NodeAddress::ground_station(index))
        } else {
            None
        }
    }

    /// Node owning an interface address. Addresses outside the plan decode to `None`.
    pub fn decode(&self, ip: Ipv4Addr) -> Option<NodeAddress> {
        let [net, x, y, host] = ip.octets();
        match net {
            GSL_NET => match host {
                GSL_SATELLITE_HOST => self.node(y as usize).filter(NodeAddress::is_satellite),
                GSL_GROUND_HOST => {
                    let gs = x as usize + self.constellation_size;
                    self.node(gs).filter(|node| !node.is_satellite())
                }
                _ => None,
            },
            ISL_NET => {
                let link = ((x as usize) << 8) | y as usize;
                if link == 0 {
                    return None;
                }
                self.node((link - 1) / 2 + 1).filter(NodeAddress::is_satellite)
            }
            _ => None,
        }
    }

    pub fn decode_str(&self, ip: &str) -> Option<NodeAddress> {
        ip.trim().parse().ok().and_then(|ip| self.decode(ip))
    }

    /// Interface address on the link between `satellite` and `ground_station`.
    pub fn gsl_address(
        &self,
        satellite: usize,
        ground_station: usize,
        endpoint: GslEndpoint,
    ) -> Option<Ipv4Addr> {
        self.node(satellite).filter(NodeAddress::is_satellite)?;
        self.node(ground_station).filter(|node| !node.is_satellite())?;

        let x = u8::try_from(ground_station - self.constellation_size).ok()?;
        let y = u8::try_from(satellite).ok()?;
        let host = match endpoint {
            GslEndpoint::Satellite => GSL_SATELLITE_HOST,
            GslEndpoint::Ground => GSL_GROUND_HOST,
        };
        Some(Ipv4Addr::new(GSL_NET, x, y, host))
    }

    /// The owning satellite's interface on one of its inter-satellite links.
    pub fn isl_address(&self, satellite: usize, link: IslLink) -> Option<Ipv4Addr> {
        self.node(satellite).filter(NodeAddress::is_satellite)?;

        let number = 2 * (satellite - 1) + link.offset();
        let x = u8::try_from(number >> 8).ok()?;
        let y = (number & 0xff) as u8;
        Some(Ipv4Addr::new(ISL_NET, x, y, link.owner_host()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn plan() -> Addressing {
        Addressing::new(200, 20)
    }

    #[test]
    fn classifies_flat_indices() {
        let a = Addressing::new(4, 2);
        assert_eq!(a.node(0), None);
        assert_eq!(a.node(1), Some(NodeAddress::satellite(1)));
        assert_eq!(a.node(4), Some(NodeAddress::satellite(4)));
        assert_eq!(a.node(5), Some(NodeAddress::ground_station(5)));
        assert_eq!(a.node(6), Some(NodeAddress::ground_station(6)));
        assert_eq!(a.node(7), None);
    }

    #[rstest]
    #[case("9.1.1.50", Some(NodeAddress::satellite(1)))]
    #[case("9.3.17.50", Some(NodeAddress::satellite(17)))]
    #[case("9.1.1.60", Some(NodeAddress::ground_station(201)))]
    #[case("9.20.7.60", Some(NodeAddress::ground_station(220)))]
    #[case("9.21.7.60", None)]
    #[case("9.1.0.50", None)]
    #[case("9.1.201.50", None)]
    #[case("9.1.1.99", None)]
    #[case("10.0.1.40", Some(NodeAddress::satellite(1)))]
    #[case("10.0.2.30", Some(NodeAddress::satellite(1)))]
    #[case("10.0.3.10", Some(NodeAddress::satellite(2)))]
    #[case("10.1.0.20", Some(NodeAddress::satellite(128)))]
    #[case("10.1.144.40", Some(NodeAddress::satellite(200)))]
    #[case("10.1.145.40", None)]
    #[case("10.0.0.1", None)]
    #[case("192.168.1.1", None)]
    fn decodes_addresses(#[case] ip: &str, #[case] expected: Option<NodeAddress>) {
        assert_eq!(plan().decode_str(ip), expected);
    }

    #[test]
    fn garbage_does_not_decode() {
        assert_eq!(plan().decode_str("not-an-ip"), None);
        assert_eq!(plan().decode_str(""), None);
    }

    #[test]
    fn encoded_addresses_decode_to_their_owner() {
        let a = plan();
        for sat in 1..=a.constellation_size() {
            for link in [IslLink::IntraOrbit, IslLink::InterOrbit] {
                let ip = a.isl_address(sat, link).unwrap();
                assert_eq!(a.decode(ip), Some(NodeAddress::satellite(sat)), "{ip}");
            }
            let gs = 201 + sat % 20;
            let sat_side = a.gsl_address(sat, gs, GslEndpoint::Satellite).unwrap();
            let gs_side = a.gsl_address(sat, gs, GslEndpoint::Ground).unwrap();
            assert_eq!(a.decode(sat_side), Some(NodeAddress::satellite(sat)));
            assert_eq!(a.decode(gs_side), Some(NodeAddress::ground_station(gs)));
        }
    }

    #[test]
    fn encoding_rejects_out_of_range_nodes() {
        let a = Addressing::new(4, 2);
        assert_eq!(a.isl_address(0, IslLink::IntraOrbit), None);
        assert_eq!(a.isl_address(5, IslLink::IntraOrbit), None);
        assert_eq!(a.gsl_address(5, 5, GslEndpoint::Ground), None);
        assert_eq!(a.gsl_address(1, 7, GslEndpoint::Ground), None);
        assert_eq!(
            a.gsl_address(2, 6, GslEndpoint::Ground),
            Some(Ipv4Addr::new(9, 2, 2, 60))
        );
    }

    #[test]
    fn octets_limit_the_gsl_plan() {
        let a = Addressing::new(300, 1);
        assert_eq!(a.gsl_address(256, 301, GslEndpoint::Satellite), None);
        assert!(a.gsl_address(255, 301, GslEndpoint::Satellite).is_some());
    }

    #[test]
    fn node_display_uses_category_tag() {
        assert_eq!(NodeAddress::satellite(3).to_string(), "sat-3");
        assert_eq!(NodeAddress::ground_station(105).to_string(), "gs-105");
        assert_eq!(NodeCategory::GroundStation.label(), "GS");
    }
}
