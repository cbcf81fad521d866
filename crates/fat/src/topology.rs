/*!
 * Shared Suite Topology
 *
 * The primary/failover LDAP topology every FAT suite provisions: three
 * plain primaries each backed by a failover instance, one SSL pair, plus
 * a second alternative failover for the first primary. Registration order
 * is load-bearing; it fixes both failover trial order and provisioning
 * order.
 *
 * Author: LDAP Registry FAT Team
 * Created: 2026-08-20
 */

use std::collections::BTreeMap;

use ldap_topology::{ServerEndpoint, TopologyRegistry};

const SSL_BIND_DN: &str = "cn=root,o=ibm,c=us";
const SSL_BIND_PASSWORD: &str = "rootpwd";

/// Build the standard suite topology
pub fn suite_topology() -> TopologyRegistry {
    let mut topology = TopologyRegistry::new();
    topology
        .register(
            ServerEndpoint::new("ldap1.fat.local", 10389),
            ServerEndpoint::new("ldap4.fat.local", 10389),
        )
        .register(
            ServerEndpoint::new("ldap2.fat.local", 10389),
            ServerEndpoint::new("ldap5.fat.local", 10389),
        )
        .register(
            ServerEndpoint::new("ldap3.fat.local", 10389),
            ServerEndpoint::new("ldap6.fat.local", 10389),
        )
        .register(
            ServerEndpoint::with_ssl("ldap1.fat.local", 10636, SSL_BIND_DN, SSL_BIND_PASSWORD),
            ServerEndpoint::with_ssl("ldap4.fat.local", 10636, SSL_BIND_DN, SSL_BIND_PASSWORD),
        )
        // Second-choice failover for the first primary, tried after
        // ldap4 per registration order
        .register(
            ServerEndpoint::new("ldap1.fat.local", 10389),
            ServerEndpoint::new("ldap5.fat.local", 10389),
        );
    topology
}

/// Render the topology as bootstrap properties for the server under test.
///
/// Primaries are numbered in registration order; each primary's failovers
/// are numbered in trial order beneath it.
pub fn bootstrap_vars(topology: &TopologyRegistry) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for (i, key) in topology.primaries().enumerate() {
        let n = i + 1;
        vars.insert(format!("ldap.server.{n}.name"), key.name.clone());
        vars.insert(format!("ldap.server.{n}.port"), key.port.to_string());
        for (j, mapping) in topology.failovers_for(key).iter().enumerate() {
            let m = j + 1;
            vars.insert(
                format!("ldap.server.{n}.failover.{m}.name"),
                mapping.failover.name.clone(),
            );
            vars.insert(
                format!("ldap.server.{n}.failover.{m}.port"),
                mapping.failover.port.to_string(),
            );
        }
    }
    vars
}
