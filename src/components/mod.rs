pub mod add_system;
pub mod controls;
pub mod detail_panel;
pub mod flow_diagram;
