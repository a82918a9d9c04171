fn main() -> shadow_rs::SdResult<()> {
    let _shadow = shadow_rs::ShadowBuilder::builder().build()?;
    Ok(())
}
