pub mod clinvar;
pub mod training_set;
pub mod training_table;
