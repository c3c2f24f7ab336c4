mod check_only;
mod dump_topology;
mod missing_source;
