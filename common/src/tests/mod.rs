mod double_count;
mod statement_scenario;
