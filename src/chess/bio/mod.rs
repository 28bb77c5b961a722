pub mod gtf_scan;
pub mod nomenclature_tsv;
