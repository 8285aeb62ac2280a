// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Register and cluster reconciliation: repetition expansion, derivation,
//! and recursion through nested clusters.

use catalog_store::{Filter, RecordId};

use crate::dim::{self, DimGroup};
use crate::doc::{chain_child, chain_text, derivation_chain, Element};
use crate::draft::Draft;
use crate::hexval::HexValue;
use crate::{SyncError, SyncResult};

use super::{chain_hex, hex_child, match_by_name, require_name, Reconciler};

/// Which parent a register or cluster row hangs off.
#[derive(Clone, Copy)]
pub(crate) enum Scope {
    Peripheral(RecordId),
    Cluster(RecordId),
}

impl Scope {
    fn column(&self) -> &'static str {
        match self {
            Scope::Peripheral(_) => "per_id",
            Scope::Cluster(_) => "cluster_id",
        }
    }

    fn id(&self) -> RecordId {
        match self {
            Scope::Peripheral(id) | Scope::Cluster(id) => *id,
        }
    }

    fn filter(&self) -> Filter {
        Filter::new().eq(self.column(), self.id().to_string())
    }
}

// Scalar children a <cluster> carries besides its structural ones.
const CLUSTER_SCALAR_TAGS: &[&str] = &[
    "name",
    "displayName",
    "description",
    "addressOffset",
    "alternateCluster",
    "headerStructName",
    "size",
    "access",
    "protection",
    "resetValue",
    "resetMask",
    "dim",
    "dimIncrement",
    "dimIndex",
    "dimName",
    "dimArrayIndex",
];

impl Reconciler<'_> {
    /// Walks the structural children of a `<registers>` section or of a
    /// cluster body. Tags in `skip` are the container's own scalars;
    /// anything else that is not a register or cluster is malformed.
    pub(crate) fn sync_register_set(
        &mut self,
        container: Element,
        scope: Scope,
        skip: &[&str],
    ) -> SyncResult<()> {
        for child in container.children() {
            match child.tag() {
                "register" => self.sync_register_decl(child, container, scope)?,
                "cluster" => self.sync_cluster_decl(child, scope)?,
                tag if skip.contains(&tag) => {}
                tag => {
                    return Err(SyncError::MalformedDocument(format!(
                        "unexpected <{}> in <{}>",
                        tag,
                        container.tag()
                    )))
                }
            }
        }
        Ok(())
    }

    /// One `<register>` declaration, expanded when it carries a valid
    /// repetition group.
    fn sync_register_decl(
        &mut self,
        node: Element,
        container: Element,
        scope: Scope,
    ) -> SyncResult<()> {
        let template = require_name(&node, "register")?;
        let chain = derivation_chain(node, container, "register", "register")?;
        let fields = chain_child(&chain, "fields");

        let offset = chain_hex(&chain, "addressOffset");
        if offset.is_none() {
            return Err(SyncError::MalformedDocument(format!(
                "register '{template}' without a usable addressOffset"
            )));
        }

        let Some(group) = DimGroup::from_chain(&chain) else {
            let display = display_for(&chain, None);
            return self.sync_register_instance(
                &chain,
                fields,
                template.to_string(),
                display,
                offset,
                scope,
            );
        };
        if !group.is_valid() {
            return Err(SyncError::MalformedDocument(format!(
                "register '{template}' declares an invalid repetition group"
            )));
        }
        let mut offset = offset;
        for token in group.index_tokens() {
            let name = dim::apply_index(template, &token);
            let display = display_for(&chain, Some(&token));
            self.sync_register_instance(&chain, fields, name, display, offset.clone(), scope)?;
            offset = offset.add(group.increment());
        }
        Ok(())
    }

    /// One expanded register instance. Scalar content resolves through the
    /// derivation chain; the drafted offset is the expanded one.
    fn sync_register_instance(
        &mut self,
        chain: &[Element],
        fields: Option<Element>,
        name: String,
        display_name: Option<String>,
        offset: HexValue,
        scope: Scope,
    ) -> SyncResult<()> {
        let records = self.store.fetch("register", &scope.filter())?;
        let existing = match_by_name("register", &records, &name)?;

        let mut draft = Draft::new();
        draft.push_text("name", &name);
        draft.push_opt_text("display_name", display_name.as_deref());
        draft.push_opt_text("description", chain_text(chain, "description"));
        draft.push_hex("address_offset", &offset);
        if let Some(bits) = chain_hex(chain, "size").to_u64().and_then(|bits| i64::try_from(bits).ok()) {
            draft.push_int("size", bits);
        }
        draft.push_opt_text("access", chain_text(chain, "access"));
        draft.push_hex("reset_value", &chain_hex(chain, "resetValue"));
        draft.push_hex("reset_mask", &chain_hex(chain, "resetMask"));
        draft.push_opt_text("alternate_register", chain_text(chain, "alternateRegister"));
        draft.push_opt_text("alternate_group", chain_text(chain, "alternateGroup"));
        draft.push_opt_text("data_type", chain_text(chain, "dataType"));
        draft.push_opt_text("read_action", chain_text(chain, "readAction"));
        draft.push_opt_text(
            "modified_write_values",
            chain_text(chain, "modifiedWriteValues"),
        );
        draft.push_id(scope.column(), scope.id());
        let register_id = self.sync_record("register", &name, existing, &draft)?;

        if let Some(fields) = fields {
            self.sync_fields(fields, register_id)?;
        }
        Ok(())
    }

    /// One `<cluster>` declaration. Clusters do not derive; their register
    /// children recurse with the cluster row as the new scope. A childless
    /// cluster is only legal when it repeats.
    fn sync_cluster_decl(&mut self, node: Element, scope: Scope) -> SyncResult<()> {
        let template = require_name(&node, "cluster")?;
        if node.attribute("derivedFrom").is_some() {
            return Err(SyncError::Unsupported(format!(
                "cluster '{template}' uses derivedFrom"
            )));
        }
        let offset = hex_child(&node, "addressOffset");
        if offset.is_none() {
            return Err(SyncError::MalformedDocument(format!(
                "cluster '{template}' without a usable addressOffset"
            )));
        }

        let Some(group) = DimGroup::from_chain(&[node]) else {
            let has_structure = node
                .children()
                .any(|child| child.tag() == "register" || child.tag() == "cluster");
            if !has_structure {
                return Err(SyncError::MalformedDocument(format!(
                    "cluster '{template}' declares no registers or clusters"
                )));
            }
            let display = display_for(&[node], None);
            return self.sync_cluster_instance(node, template.to_string(), display, offset, scope);
        };
        if !group.is_valid() {
            return Err(SyncError::MalformedDocument(format!(
                "cluster '{template}' declares an invalid repetition group"
            )));
        }
        let mut offset = offset;
        for token in group.index_tokens() {
            let name = dim::apply_index(template, &token);
            let display = display_for(&[node], Some(&token));
            self.sync_cluster_instance(node, name, display, offset.clone(), scope)?;
            offset = offset.add(group.increment());
        }
        Ok(())
    }

    /// One expanded cluster instance and, under its id, its children.
    /// Child offsets stay relative to this instance.
    fn sync_cluster_instance(
        &mut self,
        node: Element,
        name: String,
        display_name: Option<String>,
        offset: HexValue,
        scope: Scope,
    ) -> SyncResult<()> {
        let records = self.store.fetch("cluster", &scope.filter())?;
        let existing = match_by_name("cluster", &records, &name)?;

        let mut draft = Draft::new();
        draft.push_text("name", &name);
        draft.push_opt_text("display_name", display_name.as_deref());
        draft.push_opt_text("description", node.child_text("description"));
        draft.push_hex("address_offset", &offset);
        draft.push_id(scope.column(), scope.id());
        let cluster_id = self.sync_record("cluster", &name, existing, &draft)?;

        self.sync_register_set(node, Scope::Cluster(cluster_id), CLUSTER_SCALAR_TAGS)
    }
}

/// Display name for one instance: the declared template with the index
/// token substituted when the declaration repeats.
fn display_for(chain: &[Element], token: Option<&str>) -> Option<String> {
    let template = chain_text(chain, "displayName")?;
    Some(match token {
        Some(token) => dim::apply_index(template, token),
        None => template.to_string(),
    })
}
