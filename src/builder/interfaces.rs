use async_graphql::dynamic::{Interface, InterfaceField, TypeRef};

use super::Builder;

impl Builder {
    /// Registers the four relay abstractions every synthesized connection
    /// implements. Built once per schema; later calls are no-ops.
    pub(crate) fn build_interfaces(&mut self) {
        if self.registry.has_interface("IConnection") {
            return;
        }

        let node = Interface::new("INode")
            .description("An object with a globally unique identifier")
            .field(InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID)));
        self.registry.register_interface("INode", node);

        // Interface fields are validated invariantly against their
        // implementors, so each one mirrors the synthesized object exactly.
        // The per-element `node` and `edges` fields live only on the
        // concrete types.
        let edge = Interface::new("IEdge")
            .description("A single entry in a connection, paired with its cursor")
            .field(InterfaceField::new(
                "cursor",
                TypeRef::named_nn(TypeRef::STRING),
            ));
        self.registry.register_interface("IEdge", edge);

        let page_info = Interface::new("IPageInfo")
            .description("Pagination position for a connection")
            .field(InterfaceField::new(
                "startCursor",
                TypeRef::named_nn(TypeRef::STRING),
            ))
            .field(InterfaceField::new(
                "endCursor",
                TypeRef::named_nn(TypeRef::STRING),
            ))
            .field(InterfaceField::new(
                "hasMore",
                TypeRef::named_nn(TypeRef::BOOLEAN),
            ));
        self.registry.register_interface("IPageInfo", page_info);

        let connection = Interface::new("IConnection")
            .description("A paginated set of edges")
            .field(InterfaceField::new(
                "pageInfo",
                TypeRef::named_nn("PageInfo"),
            ));
        self.registry.register_interface("IConnection", connection);
    }
}
