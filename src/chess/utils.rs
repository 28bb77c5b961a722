use flexstr::SharedStr as FlexStr;

pub fn join(v: &[FlexStr], connector: &str) -> FlexStr {
    let result = itertools::join(v.iter().map(FlexStr::as_ref), connector);
    result.into()
}

// "chr1_random, chrUn_xyz and 3 more" style summaries for warning output
pub fn abbreviated_list(v: &[FlexStr], max_shown: usize) -> String {
    if v.len() <= max_shown {
        itertools::join(v.iter().map(FlexStr::as_ref), ", ")
    } else {
        let shown = itertools::join(v[0..max_shown].iter().map(FlexStr::as_ref), ", ");
        format!("{} and {} more", shown, v.len() - max_shown)
    }
}
